use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use presensi_core::conflict::ConflictKind;
use presensi_core::errors::JadwalError;
use presensi_core::models::enums::{Hari, JenisAktivitas};
use presensi_core::models::jadwal::SlotDraft;
use presensi_db::repositories::jadwal::race_conflict;
use uuid::Uuid;

fn draft(jam_ke: i16) -> SlotDraft {
    SlotDraft {
        kelas_id: Uuid::new_v4(),
        hari: Hari::Senin,
        jam_ke,
        jam_mulai: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        jam_selesai: NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
        jenis_aktivitas: JenisAktivitas::Pelajaran,
        mapel_id: Some(Uuid::new_v4()),
        ruang_id: None,
        catatan: None,
        guru_ids: vec![Uuid::new_v4()],
    }
}

#[test]
fn race_report_points_at_the_losing_draft() {
    let draft = draft(3);

    let err = race_conflict(&draft, 2);

    let report = match err {
        JadwalError::Conflict(report) => report,
        other => panic!("expected a conflict, got {:?}", other),
    };
    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::ClassConflict);
    assert_eq!(conflict.hari, Hari::Senin);
    assert_eq!(conflict.resource_id, draft.kelas_id);
    // The batch index of the draft that lost the race, not always 0.
    assert_eq!(conflict.candidate.candidate_index, Some(2));
    assert_eq!(conflict.candidate.kelas_id, draft.kelas_id);
    assert_eq!(conflict.candidate.jam_ke, 3);
    assert!(conflict.message.contains("concurrent"));
}

#[test]
fn single_slot_paths_report_index_zero() {
    let err = race_conflict(&draft(1), 0);
    match err {
        JadwalError::Conflict(report) => {
            assert_eq!(report.conflicts[0].candidate.candidate_index, Some(0));
        }
        other => panic!("expected a conflict, got {:?}", other),
    }
}
