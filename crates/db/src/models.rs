use chrono::{DateTime, NaiveTime, Utc};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use presensi_core::conflict::SlotCandidate;
use presensi_core::models::enums::{Hari, JenisAktivitas, Status};
use presensi_core::models::jadwal::{GuruAssignment, Jadwal};
use presensi_core::models::jam_pelajaran::JamPelajaran;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbKelas {
    pub id: Uuid,
    pub nama: String,
    pub tingkat: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbGuru {
    pub id: Uuid,
    pub nama: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMapel {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRuang {
    pub id: Uuid,
    pub nama: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbJamPelajaran {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub label: Option<String>,
    pub status: String,
}

impl DbJamPelajaran {
    pub fn into_domain(self) -> Result<JamPelajaran> {
        Ok(JamPelajaran {
            id: self.id,
            kelas_id: self.kelas_id,
            jam_ke: self.jam_ke,
            jam_mulai: self.jam_mulai,
            jam_selesai: self.jam_selesai,
            label: self.label,
            status: self.status.parse::<Status>().map_err(|e| eyre!(e))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbJadwal {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub hari: String,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub jenis_aktivitas: String,
    pub mapel_id: Option<Uuid>,
    pub ruang_id: Option<Uuid>,
    pub catatan: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbJadwal {
    pub fn into_domain(self) -> Result<Jadwal> {
        Ok(Jadwal {
            id: self.id,
            kelas_id: self.kelas_id,
            hari: self.hari.parse::<Hari>().map_err(|e| eyre!(e))?,
            jam_ke: self.jam_ke,
            jam_mulai: self.jam_mulai,
            jam_selesai: self.jam_selesai,
            jenis_aktivitas: self
                .jenis_aktivitas
                .parse::<JenisAktivitas>()
                .map_err(|e| eyre!(e))?,
            mapel_id: self.mapel_id,
            ruang_id: self.ruang_id,
            catatan: self.catatan,
            status: self.status.parse::<Status>().map_err(|e| eyre!(e))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbJadwalGuru {
    pub jadwal_id: Uuid,
    pub guru_id: Uuid,
    pub is_primary: bool,
}

impl From<&DbJadwalGuru> for GuruAssignment {
    fn from(row: &DbJadwalGuru) -> Self {
        GuruAssignment {
            guru_id: row.guru_id,
            is_primary: row.is_primary,
        }
    }
}

/// An active jadwal row with its teacher ids aggregated, as loaded by
/// the conflict-set query.
#[derive(Debug, Clone, FromRow)]
pub struct DbJadwalWithGuru {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub hari: String,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub ruang_id: Option<Uuid>,
    pub guru_ids: Vec<Uuid>,
}

impl DbJadwalWithGuru {
    pub fn into_candidate(self) -> Result<SlotCandidate> {
        Ok(SlotCandidate {
            id: Some(self.id),
            kelas_id: self.kelas_id,
            hari: self.hari.parse::<Hari>().map_err(|e| eyre!(e))?,
            jam_ke: self.jam_ke,
            jam_mulai: self.jam_mulai,
            jam_selesai: self.jam_selesai,
            guru_ids: self.guru_ids,
            ruang_id: self.ruang_id,
        })
    }
}
