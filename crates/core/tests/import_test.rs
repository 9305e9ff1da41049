use std::collections::HashMap;

use pretty_assertions::assert_eq;
use presensi_core::conflict::{find_conflicts, ConflictKind};
use presensi_core::import::{
    admit_rows, collect_rows, detect_format, flag_conflicting_rows, normalize_header,
    raw_row_from_fields, screen_references, validate_row, IdDirectory, NameDirectory, RawRow,
    RowFormat,
};
use presensi_core::models::enums::{Hari, JenisAktivitas};
use uuid::Uuid;

fn by_name_row(overrides: &[(&str, &str)]) -> RawRow {
    let mut map: HashMap<String, String> = [
        ("kelas", "X IPA 1"),
        ("hari", "Senin"),
        ("jam_ke", "1"),
        ("jam_mulai", "08:00"),
        ("jam_selesai", "08:45"),
        ("jenis_aktivitas", "lesson"),
        ("mapel", "Matematika"),
        ("guru", "Budi Santoso"),
        ("guru_tambahan", ""),
        ("ruang", ""),
        ("catatan", ""),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        map.insert(k.to_string(), v.to_string());
    }
    raw_row_from_fields(RowFormat::ByName, &map)
}

fn directory() -> (NameDirectory, Uuid, Uuid, Uuid) {
    let mut dir = NameDirectory::new();
    let kelas = Uuid::new_v4();
    let mapel = Uuid::new_v4();
    let guru = Uuid::new_v4();
    dir.add_kelas("X IPA 1", kelas);
    dir.add_kelas("X IPA 2", Uuid::new_v4());
    dir.add_mapel("Matematika", mapel);
    dir.add_guru("Budi Santoso", guru);
    dir.add_guru("Siti Aminah", Uuid::new_v4());
    dir.add_ruang("Lab IPA", Uuid::new_v4());
    (dir, kelas, mapel, guru)
}

#[test]
fn header_normalization_and_format_detection() {
    assert_eq!(normalize_header(" Guru Tambahan "), "guru_tambahan");

    let by_id: Vec<String> = ["kelas_id", "hari", "jam_ke"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(detect_format(&by_id).unwrap(), RowFormat::ById);

    let by_name: Vec<String> = ["kelas", "hari", "jam_ke"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(detect_format(&by_name).unwrap(), RowFormat::ByName);

    let unknown: Vec<String> = ["foo", "bar"].iter().map(|s| s.to_string()).collect();
    assert!(detect_format(&unknown).is_err());
}

#[test]
fn name_based_row_resolves_to_ids() {
    let (dir, kelas, mapel, guru) = directory();
    let raw = by_name_row(&[]);

    let draft = validate_row(&raw, &dir, 2).unwrap();

    assert_eq!(draft.kelas_id, kelas);
    assert_eq!(draft.mapel_id, Some(mapel));
    assert_eq!(draft.guru_ids, vec![guru]);
    assert_eq!(draft.hari, Hari::Senin);
    assert_eq!(draft.jenis_aktivitas, JenisAktivitas::Pelajaran);
}

#[test]
fn co_teachers_resolve_with_first_as_primary() {
    let (mut dir, _, _, primary) = directory();
    let co = Uuid::new_v4();
    dir.add_guru("Rina Wati", co);
    let raw = by_name_row(&[("guru_tambahan", "Rina Wati, Siti Aminah")]);

    let draft = validate_row(&raw, &dir, 2).unwrap();

    assert_eq!(draft.guru_ids.len(), 3);
    assert_eq!(draft.guru_ids[0], primary);
    assert_eq!(draft.guru_ids[1], co);
}

#[test]
fn unresolved_name_is_a_row_error_not_an_abort() {
    let (dir, ..) = directory();
    let rows = vec![
        (2, by_name_row(&[("guru", "Tidak Ada")])),
        (3, by_name_row(&[])),
    ];

    let (valid, errors) = collect_rows(&rows, &dir);

    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].0, 3);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, 2);
    assert!(errors[0].messages[0].contains("Tidak Ada"));
}

#[test]
fn id_based_row_parses_comma_separated_guru_ids() {
    let kelas = Uuid::new_v4();
    let mapel = Uuid::new_v4();
    let guru_a = Uuid::new_v4();
    let guru_b = Uuid::new_v4();
    let map: HashMap<String, String> = [
        ("kelas_id", kelas.to_string()),
        ("hari", "selasa".to_string()),
        ("jam_ke", "2".to_string()),
        ("jam_mulai", "08:45".to_string()),
        ("jam_selesai", "09:30".to_string()),
        ("jenis_aktivitas", "lesson".to_string()),
        ("mapel_id", mapel.to_string()),
        ("guru_ids", format!("{}, {}", guru_a, guru_b)),
        ("ruang_id", String::new()),
        ("catatan", String::new()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let raw = raw_row_from_fields(RowFormat::ById, &map);

    let draft = validate_row(&raw, &NameDirectory::new(), 2).unwrap();

    assert_eq!(draft.kelas_id, kelas);
    assert_eq!(draft.guru_ids, vec![guru_a, guru_b]);
    assert_eq!(draft.hari, Hari::Selasa);
}

#[test]
fn row_errors_accumulate_every_problem() {
    let (dir, ..) = directory();
    let raw = by_name_row(&[
        ("hari", "minggu"),
        ("jam_mulai", "25:00"),
        ("jam_selesai", ""),
    ]);

    let err = validate_row(&raw, &dir, 4).unwrap_err();

    assert_eq!(err.row, 4);
    assert!(err.messages.len() >= 3);
}

#[test]
fn other_kind_requires_note_lesson_requires_subject_and_teacher() {
    let (dir, ..) = directory();

    let other_without_note = by_name_row(&[
        ("jenis_aktivitas", "other"),
        ("mapel", ""),
        ("guru", ""),
        ("catatan", ""),
    ]);
    assert!(validate_row(&other_without_note, &dir, 2).is_err());

    let other_with_note = by_name_row(&[
        ("jenis_aktivitas", "other"),
        ("mapel", ""),
        ("guru", ""),
        ("catatan", "Upacara"),
    ]);
    let draft = validate_row(&other_with_note, &dir, 2).unwrap();
    assert_eq!(draft.jenis_aktivitas, JenisAktivitas::Lainnya);
    assert_eq!(draft.catatan.as_deref(), Some("Upacara"));

    let lesson_without_subject = by_name_row(&[("mapel", "")]);
    assert!(validate_row(&lesson_without_subject, &dir, 2).is_err());
}

#[test]
fn duplicate_teacher_booking_across_rows_is_caught_by_batch_check() {
    // Two rows assign the same teacher to senin period 1 in different
    // classes. The pure stage accepts both rows; the pairwise batch
    // conflict check is what flags them.
    let (dir, ..) = directory();
    let rows = vec![
        (2, by_name_row(&[])),
        (3, by_name_row(&[("kelas", "X IPA 2")])),
    ];

    let (valid, errors) = collect_rows(&rows, &dir);
    assert_eq!(valid.len(), 2);
    assert!(errors.is_empty());

    let candidates: Vec<_> = valid
        .iter()
        .map(|(_, draft)| draft.candidate(None))
        .collect();
    let report = find_conflicts(&candidates, &[], &[]);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].kind, ConflictKind::TeacherConflict);
    assert_eq!(report.conflicts[0].candidate.candidate_index, Some(0));
    assert_eq!(report.conflicts[0].other.candidate_index, Some(1));
}

#[test]
fn commit_admits_the_first_of_two_clashing_rows() {
    // Same teacher booked twice on senin period 1 for different
    // classes: the row appearing first in the file is kept, the later
    // one becomes a row error.
    let (dir, ..) = directory();
    let rows = vec![
        (2, by_name_row(&[])),
        (3, by_name_row(&[("kelas", "X IPA 2")])),
    ];
    let (valid, errors) = collect_rows(&rows, &dir);
    assert!(errors.is_empty());

    let (admitted, errors) = admit_rows(valid, &[]);

    let admitted_rows: Vec<usize> = admitted.iter().map(|(row, _)| *row).collect();
    assert_eq!(admitted_rows, vec![2]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, 3);
    assert!(errors[0].messages[0].contains("Teacher"));
}

#[test]
fn commit_rejects_a_row_clashing_with_the_committed_store() {
    let (dir, _, _, guru) = directory();
    let rows = vec![(2, by_name_row(&[]))];
    let (valid, errors) = collect_rows(&rows, &dir);
    assert!(errors.is_empty());

    // The same teacher already holds senin period 1 in another class.
    let mut occupied = valid[0].1.candidate(Some(Uuid::new_v4()));
    occupied.kelas_id = Uuid::new_v4();
    occupied.guru_ids = vec![guru];

    let (admitted, errors) = admit_rows(valid, &[occupied]);

    assert!(admitted.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, 2);
}

#[test]
fn dry_run_flags_both_sides_of_an_in_file_clash() {
    let (dir, ..) = directory();
    let rows = vec![
        (2, by_name_row(&[])),
        (3, by_name_row(&[("kelas", "X IPA 2")])),
    ];
    let (valid, errors) = collect_rows(&rows, &dir);
    assert!(errors.is_empty());

    let (clean, errors) = flag_conflicting_rows(valid, &[]);

    assert!(clean.is_empty());
    let flagged: Vec<usize> = errors.iter().map(|e| e.row).collect();
    assert_eq!(flagged, vec![2, 3]);
}

#[test]
fn unknown_reference_id_fails_its_row_only() {
    let kelas = Uuid::new_v4();
    let mapel = Uuid::new_v4();
    let known_guru = Uuid::new_v4();
    let unknown_guru = Uuid::new_v4();

    let row = |jam_ke: &str, guru: Uuid| {
        let map: HashMap<String, String> = [
            ("kelas_id", kelas.to_string()),
            ("hari", "senin".to_string()),
            ("jam_ke", jam_ke.to_string()),
            ("jam_mulai", "08:00".to_string()),
            ("jam_selesai", "08:45".to_string()),
            ("jenis_aktivitas", "lesson".to_string()),
            ("mapel_id", mapel.to_string()),
            ("guru_ids", guru.to_string()),
            ("ruang_id", String::new()),
            ("catatan", String::new()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        raw_row_from_fields(RowFormat::ById, &map)
    };
    let rows = vec![(2, row("1", known_guru)), (3, row("2", unknown_guru))];
    let (valid, errors) = collect_rows(&rows, &NameDirectory::new());
    assert!(errors.is_empty());

    let mut ids = IdDirectory::new();
    ids.add_kelas(kelas);
    ids.add_mapel(mapel);
    ids.add_guru(known_guru);

    let (clean, errors) = screen_references(valid, &ids);

    assert_eq!(clean.len(), 1);
    assert_eq!(clean[0].0, 2);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row, 3);
    assert_eq!(
        errors[0].messages,
        vec![format!("Unknown guru id '{}'", unknown_guru)]
    );
}
