use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use presensi_core::conflict::{find_conflicts, ConflictKind, SlotCandidate};
use presensi_core::models::enums::Hari;
use rstest::rstest;
use uuid::Uuid;

fn jam(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn slot(
    id: Option<Uuid>,
    kelas_id: Uuid,
    hari: Hari,
    jam_ke: i16,
    mulai: (u32, u32),
    selesai: (u32, u32),
) -> SlotCandidate {
    SlotCandidate {
        id,
        kelas_id,
        hari,
        jam_ke,
        jam_mulai: jam(mulai.0, mulai.1),
        jam_selesai: jam(selesai.0, selesai.1),
        guru_ids: Vec::new(),
        ruang_id: None,
    }
}

#[test]
fn overlapping_slots_in_same_class_conflict() {
    let kelas = Uuid::new_v4();
    let existing = slot(Some(Uuid::new_v4()), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    let candidate = slot(None, kelas, Hari::Senin, 2, (8, 30), (9, 15));

    let report = find_conflicts(&[candidate], &[existing.clone()], &[]);

    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::ClassConflict);
    assert_eq!(conflict.resource_id, kelas);
    assert_eq!(conflict.other.jadwal_id, existing.id);
    assert_eq!(conflict.candidate.candidate_index, Some(0));
}

#[test]
fn adjacent_slots_never_conflict() {
    // Half-open semantics: end of one == start of the next.
    let kelas = Uuid::new_v4();
    let existing = slot(Some(Uuid::new_v4()), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    let candidate = slot(None, kelas, Hari::Senin, 2, (8, 45), (9, 30));

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert!(report.is_empty());
}

#[test]
fn different_days_never_conflict() {
    let kelas = Uuid::new_v4();
    let existing = slot(Some(Uuid::new_v4()), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    let candidate = slot(None, kelas, Hari::Selasa, 1, (8, 0), (8, 45));

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert!(report.is_empty());
}

#[test]
fn duplicate_period_without_time_overlap_is_class_conflict() {
    // Hand-edited times may not overlap, but two active rows can
    // never share (kelas, hari, jam_ke).
    let kelas = Uuid::new_v4();
    let existing = slot(Some(Uuid::new_v4()), kelas, Hari::Rabu, 3, (8, 0), (8, 45));
    let candidate = slot(None, kelas, Hari::Rabu, 3, (10, 0), (10, 45));

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].kind, ConflictKind::ClassConflict);
}

#[test]
fn shared_teacher_across_classes_is_teacher_conflict() {
    let guru = Uuid::new_v4();
    let mut existing = slot(
        Some(Uuid::new_v4()),
        Uuid::new_v4(),
        Hari::Senin,
        1,
        (8, 0),
        (8, 45),
    );
    existing.guru_ids = vec![guru];
    let mut candidate = slot(None, Uuid::new_v4(), Hari::Senin, 1, (8, 0), (8, 45));
    candidate.guru_ids = vec![guru];

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::TeacherConflict);
    assert_eq!(conflict.resource_id, guru);
}

#[test]
fn co_teaching_same_slot_is_not_a_conflict() {
    // The same committed row seen from both sides (shared teacher on
    // one jadwal) must not be reported against itself.
    let guru = Uuid::new_v4();
    let id = Uuid::new_v4();
    let mut row = slot(Some(id), Uuid::new_v4(), Hari::Senin, 1, (8, 0), (8, 45));
    row.guru_ids = vec![guru, Uuid::new_v4()];

    let report = find_conflicts(&[row.clone()], &[row], &[]);

    assert!(report.is_empty());
}

#[test]
fn shared_teacher_same_class_reports_class_conflict_only() {
    let kelas = Uuid::new_v4();
    let guru = Uuid::new_v4();
    let mut existing = slot(Some(Uuid::new_v4()), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    existing.guru_ids = vec![guru];
    let mut candidate = slot(None, kelas, Hari::Senin, 2, (8, 30), (9, 15));
    candidate.guru_ids = vec![guru];

    let report = find_conflicts(&[candidate], &[existing], &[]);

    let kinds: Vec<ConflictKind> = report.conflicts.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ConflictKind::ClassConflict]);
}

#[test]
fn shared_room_is_room_conflict() {
    let ruang = Uuid::new_v4();
    let mut existing = slot(
        Some(Uuid::new_v4()),
        Uuid::new_v4(),
        Hari::Kamis,
        1,
        (9, 0),
        (9, 45),
    );
    existing.ruang_id = Some(ruang);
    let mut candidate = slot(None, Uuid::new_v4(), Hari::Kamis, 1, (9, 30), (10, 15));
    candidate.ruang_id = Some(ruang);

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].kind, ConflictKind::RoomConflict);
    assert_eq!(report.conflicts[0].resource_id, ruang);
}

#[test]
fn slots_without_room_or_teacher_are_exempt_from_those_dimensions() {
    let existing = slot(
        Some(Uuid::new_v4()),
        Uuid::new_v4(),
        Hari::Senin,
        1,
        (8, 0),
        (8, 45),
    );
    let candidate = slot(None, Uuid::new_v4(), Hari::Senin, 1, (8, 0), (8, 45));

    // Different classes, no teachers, no rooms: nothing to contest.
    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert!(report.is_empty());
}

#[test]
fn exclude_ids_suppress_the_updated_row() {
    let kelas = Uuid::new_v4();
    let id = Uuid::new_v4();
    let existing = slot(Some(id), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    // Updating the row onto its own time window must not clash with
    // its committed self.
    let mut candidate = slot(None, kelas, Hari::Senin, 1, (8, 0), (8, 45));
    candidate.id = Some(id);

    let report = find_conflicts(&[candidate], &[existing], &[id]);

    assert!(report.is_empty());
}

#[test]
fn batch_candidates_are_checked_pairwise() {
    // Two uncommitted rows both booking teacher T on senin period 1
    // in different classes must conflict with each other.
    let guru = Uuid::new_v4();
    let mut a = slot(None, Uuid::new_v4(), Hari::Senin, 1, (8, 0), (8, 45));
    a.guru_ids = vec![guru];
    let mut b = slot(None, Uuid::new_v4(), Hari::Senin, 1, (8, 0), (8, 45));
    b.guru_ids = vec![guru];

    let report = find_conflicts(&[a, b], &[], &[]);

    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::TeacherConflict);
    assert_eq!(conflict.candidate.candidate_index, Some(0));
    assert_eq!(conflict.other.candidate_index, Some(1));
}

#[test]
fn every_conflict_is_reported_not_just_the_first() {
    let kelas = Uuid::new_v4();
    let ruang = Uuid::new_v4();
    let mut existing_a = slot(Some(Uuid::new_v4()), kelas, Hari::Senin, 1, (8, 0), (8, 45));
    existing_a.ruang_id = Some(ruang);
    let mut existing_b = slot(
        Some(Uuid::new_v4()),
        Uuid::new_v4(),
        Hari::Senin,
        1,
        (8, 0),
        (8, 45),
    );
    existing_b.ruang_id = Some(ruang);

    let mut candidate = slot(None, kelas, Hari::Senin, 2, (8, 15), (9, 0));
    candidate.ruang_id = Some(ruang);

    let report = find_conflicts(&[candidate], &[existing_a, existing_b], &[]);

    // Class + room against the first row, room against the second.
    let mut kinds: Vec<ConflictKind> = report.conflicts.iter().map(|c| c.kind).collect();
    kinds.sort_by_key(|k| format!("{:?}", k));
    assert_eq!(
        kinds,
        vec![
            ConflictKind::ClassConflict,
            ConflictKind::RoomConflict,
            ConflictKind::RoomConflict,
        ]
    );
}

#[rstest]
#[case((8, 0), (8, 45), (8, 44), (9, 30), true)] // one minute of overlap
#[case((8, 0), (8, 45), (8, 45), (9, 30), false)] // adjacent
#[case((8, 0), (8, 45), (7, 0), (8, 0), false)] // adjacent before
#[case((8, 0), (8, 45), (8, 0), (8, 45), true)] // identical
#[case((8, 0), (9, 0), (8, 15), (8, 30), true)] // containment
fn half_open_overlap_matrix(
    #[case] s1: (u32, u32),
    #[case] e1: (u32, u32),
    #[case] s2: (u32, u32),
    #[case] e2: (u32, u32),
    #[case] expect_conflict: bool,
) {
    let kelas = Uuid::new_v4();
    let existing = slot(Some(Uuid::new_v4()), kelas, Hari::Jumat, 1, s1, e1);
    let candidate = slot(None, kelas, Hari::Jumat, 2, s2, e2);

    let report = find_conflicts(&[candidate], &[existing], &[]);

    assert_eq!(!report.is_empty(), expect_conflict);
}
