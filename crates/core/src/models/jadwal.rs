//! The jadwal slot: one (class, day, period) assignment, plus the
//! request/response shapes used by the API and the validated
//! `SlotDraft` consumed by the mutation operators.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::SlotCandidate;
use crate::errors::{JadwalError, JadwalResult};
use crate::models::enums::{Hari, JenisAktivitas, Status};

/// Parses a 24-hour `HH:MM` clock time.
pub fn parse_jam(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("Invalid time '{}': expected 24-hour HH:MM", s.trim()))
}

/// Formats a clock time back to `HH:MM` for responses.
pub fn format_jam(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jadwal {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub jenis_aktivitas: JenisAktivitas,
    pub mapel_id: Option<Uuid>,
    pub ruang_id: Option<Uuid>,
    pub catatan: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuruAssignment {
    pub guru_id: Uuid,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJadwalRequest {
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    /// `HH:MM`; when omitted the period catalog supplies the times.
    pub jam_mulai: Option<String>,
    pub jam_selesai: Option<String>,
    pub jenis_aktivitas: JenisAktivitas,
    pub mapel_id: Option<Uuid>,
    #[serde(default)]
    pub guru_ids: Vec<Uuid>,
    pub ruang_id: Option<Uuid>,
    pub catatan: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateRequest {
    pub slots: Vec<CreateJadwalRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneWeekRequest {
    pub source_kelas_id: Uuid,
    pub target_kelas_ids: Vec<Uuid>,
    /// Optional teacher substitution applied to every cloned slot.
    #[serde(default)]
    pub guru_remap: HashMap<Uuid, Uuid>,
    /// Optional room substitution applied to every cloned slot.
    #[serde(default)]
    pub ruang_remap: HashMap<Uuid, Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddGuruRequest {
    pub guru_id: Uuid,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JadwalResponse {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    pub jenis_aktivitas: JenisAktivitas,
    pub mapel_id: Option<Uuid>,
    pub ruang_id: Option<Uuid>,
    pub catatan: Option<String>,
    pub guru: Vec<GuruAssignment>,
    pub is_absenable: bool,
    pub is_multi_teacher: bool,
    pub status: Status,
}

impl JadwalResponse {
    pub fn from_parts(jadwal: Jadwal, guru: Vec<GuruAssignment>) -> Self {
        JadwalResponse {
            id: jadwal.id,
            kelas_id: jadwal.kelas_id,
            hari: jadwal.hari,
            jam_ke: jadwal.jam_ke,
            jam_mulai: format_jam(jadwal.jam_mulai),
            jam_selesai: format_jam(jadwal.jam_selesai),
            jenis_aktivitas: jadwal.jenis_aktivitas,
            mapel_id: jadwal.mapel_id,
            ruang_id: jadwal.ruang_id,
            catatan: jadwal.catatan,
            is_absenable: jadwal.jenis_aktivitas == JenisAktivitas::Pelajaran,
            is_multi_teacher: guru.len() > 1,
            guru,
            status: jadwal.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateResponse {
    pub created: usize,
    pub slots: Vec<JadwalResponse>,
}

/// One cell of the week-at-a-glance grid: a period slot from the
/// catalog plus whatever occupies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixCell {
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    pub label: Option<String>,
    pub slot: Option<JadwalResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixDay {
    pub hari: Hari,
    pub cells: Vec<MatrixCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResponse {
    pub kelas_id: Uuid,
    pub days: Vec<MatrixDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub conflict: bool,
    pub conflicts: Vec<crate::conflict::Conflict>,
}

/// Target-list rules shared by the clone-week and copy-periods paths.
pub fn validate_clone_targets(source_kelas_id: Uuid, target_kelas_ids: &[Uuid]) -> JadwalResult<()> {
    if target_kelas_ids.is_empty() {
        return Err(JadwalError::Validation(
            "At least one target class is required".to_string(),
        ));
    }
    if target_kelas_ids.contains(&source_kelas_id) {
        return Err(JadwalError::Validation(
            "Cannot clone a class onto itself".to_string(),
        ));
    }
    Ok(())
}

/// Re-targets a source week onto each target class, applying the
/// optional teacher/room substitutions. Each source entry carries its
/// teacher ids in assignment order, primary first; the order is
/// preserved so the clone keeps the same primary.
pub fn clone_week_drafts(
    source: &[(Jadwal, Vec<Uuid>)],
    target_kelas_ids: &[Uuid],
    guru_remap: &HashMap<Uuid, Uuid>,
    ruang_remap: &HashMap<Uuid, Uuid>,
) -> Vec<SlotDraft> {
    let mut drafts = Vec::with_capacity(source.len() * target_kelas_ids.len());
    for target in target_kelas_ids {
        for (slot, guru_ids) in source {
            drafts.push(SlotDraft {
                kelas_id: *target,
                hari: slot.hari,
                jam_ke: slot.jam_ke,
                jam_mulai: slot.jam_mulai,
                jam_selesai: slot.jam_selesai,
                jenis_aktivitas: slot.jenis_aktivitas,
                mapel_id: slot.mapel_id,
                ruang_id: slot.ruang_id.map(|r| *ruang_remap.get(&r).unwrap_or(&r)),
                catatan: slot.catatan.clone(),
                guru_ids: guru_ids
                    .iter()
                    .map(|g| *guru_remap.get(g).unwrap_or(g))
                    .collect(),
            });
        }
    }
    drafts
}

/// A fully validated slot specification. All mutation paths (single,
/// bulk, clone, import) produce one of these before touching storage;
/// the first guru id is the primary teacher.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDraft {
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub jenis_aktivitas: JenisAktivitas,
    pub mapel_id: Option<Uuid>,
    pub ruang_id: Option<Uuid>,
    pub catatan: Option<String>,
    pub guru_ids: Vec<Uuid>,
}

impl SlotDraft {
    /// Validates a create/update request into a draft. Times must be
    /// present here; callers that allow catalog fallback resolve them
    /// before calling.
    pub fn from_request(req: &CreateJadwalRequest) -> JadwalResult<Self> {
        let jam_mulai = req
            .jam_mulai
            .as_deref()
            .ok_or_else(|| JadwalError::Validation("jam_mulai is required".to_string()))?;
        let jam_selesai = req
            .jam_selesai
            .as_deref()
            .ok_or_else(|| JadwalError::Validation("jam_selesai is required".to_string()))?;
        let jam_mulai = parse_jam(jam_mulai).map_err(JadwalError::Validation)?;
        let jam_selesai = parse_jam(jam_selesai).map_err(JadwalError::Validation)?;

        let draft = SlotDraft {
            kelas_id: req.kelas_id,
            hari: req.hari,
            jam_ke: req.jam_ke,
            jam_mulai,
            jam_selesai,
            jenis_aktivitas: req.jenis_aktivitas,
            mapel_id: req.mapel_id,
            ruang_id: req.ruang_id,
            catatan: req.catatan.clone(),
            guru_ids: req.guru_ids.clone(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Field-requirement and time rules shared by every mutation path.
    pub fn validate(&self) -> JadwalResult<()> {
        match self.validation_messages().into_iter().next() {
            Some(message) => Err(JadwalError::Validation(message)),
            None => Ok(()),
        }
    }

    /// All rule violations, for callers that accumulate errors per row.
    pub fn validation_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();

        if self.jam_ke < 1 {
            messages.push(format!("jam_ke must be >= 1, got {}", self.jam_ke));
        }
        if self.jam_mulai >= self.jam_selesai {
            messages.push(format!(
                "Start time {} must be before end time {}",
                format_jam(self.jam_mulai),
                format_jam(self.jam_selesai)
            ));
        }
        match self.jenis_aktivitas {
            JenisAktivitas::Pelajaran => {
                if self.mapel_id.is_none() {
                    messages.push("Lesson slots require mapel_id".to_string());
                }
                if self.guru_ids.is_empty() {
                    messages.push("Lesson slots require at least one teacher".to_string());
                }
            }
            JenisAktivitas::Lainnya => {
                if self.catatan.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    messages.push("Non-lesson slots require a note (catatan)".to_string());
                }
            }
        }

        messages
    }

    /// View of this draft for the conflict detector. `id` is set for
    /// updates so the detector can self-exclude.
    pub fn candidate(&self, id: Option<Uuid>) -> SlotCandidate {
        SlotCandidate {
            id,
            kelas_id: self.kelas_id,
            hari: self.hari,
            jam_ke: self.jam_ke,
            jam_mulai: self.jam_mulai,
            jam_selesai: self.jam_selesai,
            guru_ids: self.guru_ids.clone(),
            ruang_id: self.ruang_id,
        }
    }
}
