use mockall::mock;
use uuid::Uuid;

use presensi_core::conflict::{ConflictReport, SlotCandidate};
use presensi_core::errors::JadwalResult;
use presensi_core::models::enums::Hari;
use presensi_core::models::jadwal::SlotDraft;
use presensi_core::models::jam_pelajaran::PeriodDef;

use crate::models::{DbJadwal, DbJadwalGuru, DbJamPelajaran, DbKelas};
use crate::repositories::jadwal::JadwalFilter;

// Mock repositories for testing
mock! {
    pub JadwalRepo {
        pub async fn list_slots(&self, filter: JadwalFilter) -> eyre::Result<Vec<DbJadwal>>;

        pub async fn get_slot(&self, id: Uuid) -> eyre::Result<Option<DbJadwal>>;

        pub async fn get_slot_guru(&self, jadwal_id: Uuid) -> eyre::Result<Vec<DbJadwalGuru>>;

        pub async fn create_slot(
            &self,
            draft: SlotDraft,
        ) -> JadwalResult<(DbJadwal, Vec<DbJadwalGuru>)>;

        pub async fn update_slot(
            &self,
            id: Uuid,
            draft: SlotDraft,
        ) -> JadwalResult<(DbJadwal, Vec<DbJadwalGuru>)>;

        pub async fn deactivate_slot(&self, id: Uuid) -> JadwalResult<()>;

        pub async fn bulk_create(
            &self,
            drafts: Vec<SlotDraft>,
        ) -> JadwalResult<Vec<(DbJadwal, Vec<DbJadwalGuru>)>>;

        pub async fn check_conflicts(
            &self,
            candidates: Vec<SlotCandidate>,
            exclude_ids: Vec<Uuid>,
        ) -> JadwalResult<ConflictReport>;

        pub async fn find_by_cell(
            &self,
            kelas_id: Uuid,
            hari: Hari,
            jam_ke: i16,
        ) -> eyre::Result<Option<DbJadwal>>;
    }
}

mock! {
    pub JamPelajaranRepo {
        pub async fn get_periods(&self, kelas_id: Uuid) -> eyre::Result<Vec<DbJamPelajaran>>;

        pub async fn get_periods_or_default(
            &self,
            kelas_id: Uuid,
        ) -> eyre::Result<Vec<PeriodDef>>;

        pub async fn upsert_periods(
            &self,
            kelas_id: Uuid,
            periods: Vec<PeriodDef>,
        ) -> JadwalResult<Vec<DbJamPelajaran>>;

        pub async fn copy_periods(
            &self,
            source_kelas_id: Uuid,
            target_kelas_ids: Vec<Uuid>,
        ) -> JadwalResult<usize>;
    }
}

mock! {
    pub RefsRepo {
        pub async fn get_kelas(&self, id: Uuid) -> eyre::Result<Option<DbKelas>>;

        pub async fn ensure_refs(&self, drafts: Vec<SlotDraft>) -> JadwalResult<()>;
    }
}
