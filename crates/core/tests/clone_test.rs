use std::collections::HashMap;

use chrono::{NaiveTime, Utc};
use pretty_assertions::assert_eq;
use presensi_core::errors::JadwalError;
use presensi_core::models::enums::{Hari, JenisAktivitas, Status};
use presensi_core::models::jadwal::{clone_week_drafts, validate_clone_targets, Jadwal};
use uuid::Uuid;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn source_slot(hari: Hari, jam_ke: i16, mapel_id: Uuid, ruang_id: Option<Uuid>) -> Jadwal {
    let start = time(7 + jam_ke as u32, 0);
    let end = time(7 + jam_ke as u32, 45);
    Jadwal {
        id: Uuid::new_v4(),
        kelas_id: Uuid::new_v4(),
        hari,
        jam_ke,
        jam_mulai: start,
        jam_selesai: end,
        jenis_aktivitas: JenisAktivitas::Pelajaran,
        mapel_id: Some(mapel_id),
        ruang_id,
        catatan: None,
        status: Status::Aktif,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn clone_targets_must_be_nonempty_and_exclude_the_source() {
    let source = Uuid::new_v4();

    let err = validate_clone_targets(source, &[]).unwrap_err();
    assert!(matches!(err, JadwalError::Validation(_)));

    let err = validate_clone_targets(source, &[Uuid::new_v4(), source]).unwrap_err();
    match err {
        JadwalError::Validation(msg) => assert!(msg.contains("onto itself")),
        other => panic!("expected a validation error, got {:?}", other),
    }

    assert!(validate_clone_targets(source, &[Uuid::new_v4()]).is_ok());
}

#[test]
fn clone_without_remaps_is_an_exact_copy_onto_the_target() {
    let guru = Uuid::new_v4();
    let mapel = Uuid::new_v4();
    let ruang = Uuid::new_v4();
    let source = vec![
        (source_slot(Hari::Senin, 1, mapel, Some(ruang)), vec![guru]),
        (source_slot(Hari::Rabu, 3, mapel, None), vec![guru]),
    ];
    let target = Uuid::new_v4();

    let drafts = clone_week_drafts(&source, &[target], &HashMap::new(), &HashMap::new());

    assert_eq!(drafts.len(), 2);
    for (draft, (slot, _)) in drafts.iter().zip(&source) {
        assert_eq!(draft.kelas_id, target);
        assert_eq!(draft.hari, slot.hari);
        assert_eq!(draft.jam_ke, slot.jam_ke);
        assert_eq!(draft.jam_mulai, slot.jam_mulai);
        assert_eq!(draft.jam_selesai, slot.jam_selesai);
        assert_eq!(draft.mapel_id, slot.mapel_id);
        assert_eq!(draft.ruang_id, slot.ruang_id);
        assert_eq!(draft.guru_ids, vec![guru]);
    }
}

#[test]
fn guru_remap_substitutes_only_the_mapped_teacher() {
    let primary = Uuid::new_v4();
    let co = Uuid::new_v4();
    let substitute = Uuid::new_v4();
    let source = vec![(
        source_slot(Hari::Senin, 1, Uuid::new_v4(), None),
        vec![primary, co],
    )];
    let remap: HashMap<Uuid, Uuid> = [(co, substitute)].into_iter().collect();

    let drafts = clone_week_drafts(&source, &[Uuid::new_v4()], &remap, &HashMap::new());

    // The primary stays first, the mapped co-teacher is swapped.
    assert_eq!(drafts[0].guru_ids, vec![primary, substitute]);
}

#[test]
fn ruang_remap_substitutes_rooms_and_leaves_unmapped_ones() {
    let lab = Uuid::new_v4();
    let other_room = Uuid::new_v4();
    let new_lab = Uuid::new_v4();
    let mapel = Uuid::new_v4();
    let guru = Uuid::new_v4();
    let source = vec![
        (source_slot(Hari::Senin, 1, mapel, Some(lab)), vec![guru]),
        (
            source_slot(Hari::Senin, 2, mapel, Some(other_room)),
            vec![guru],
        ),
        (source_slot(Hari::Senin, 3, mapel, None), vec![guru]),
    ];
    let remap: HashMap<Uuid, Uuid> = [(lab, new_lab)].into_iter().collect();

    let drafts = clone_week_drafts(&source, &[Uuid::new_v4()], &HashMap::new(), &remap);

    assert_eq!(drafts[0].ruang_id, Some(new_lab));
    assert_eq!(drafts[1].ruang_id, Some(other_room));
    assert_eq!(drafts[2].ruang_id, None);
}

#[test]
fn every_target_gets_the_whole_week() {
    let mapel = Uuid::new_v4();
    let guru = Uuid::new_v4();
    let source = vec![
        (source_slot(Hari::Senin, 1, mapel, None), vec![guru]),
        (source_slot(Hari::Selasa, 2, mapel, None), vec![guru]),
    ];
    let target_a = Uuid::new_v4();
    let target_b = Uuid::new_v4();

    let drafts = clone_week_drafts(
        &source,
        &[target_a, target_b],
        &HashMap::new(),
        &HashMap::new(),
    );

    assert_eq!(drafts.len(), 4);
    assert_eq!(drafts.iter().filter(|d| d.kelas_id == target_a).count(), 2);
    assert_eq!(drafts.iter().filter(|d| d.kelas_id == target_b).count(), 2);
}
