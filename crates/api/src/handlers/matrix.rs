//! Week-at-a-glance grid: read, single-cell write, and the dry-run
//! conflict check used while editing cells.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use presensi_core::conflict::SlotCandidate;
use presensi_core::errors::JadwalError;
use presensi_core::models::enums::Hari;
use presensi_core::models::jadwal::{
    format_jam, parse_jam, ConflictCheckResponse, CreateJadwalRequest, JadwalResponse, MatrixCell,
    MatrixDay, MatrixResponse,
};
use presensi_db::repositories::{jadwal, jam_pelajaran};

use crate::handlers::jadwal::{resolve_draft, slot_response};
use crate::{middleware::error_handling::AppError, ApiState};

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub kelas_id: Uuid,
}

#[axum::debug_handler]
pub async fn get_matrix(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<MatrixQuery>,
) -> Result<Json<MatrixResponse>, AppError> {
    let periods = jam_pelajaran::get_periods_or_default(&state.db_pool, query.kelas_id).await?;

    let filter = jadwal::JadwalFilter {
        kelas_id: Some(query.kelas_id),
        ..Default::default()
    };
    let slots = jadwal::list_slots(&state.db_pool, &filter).await?;
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let guru_rows = jadwal::get_guru_for_slots(&state.db_pool, &ids).await?;

    let mut responses: Vec<JadwalResponse> = Vec::with_capacity(slots.len());
    for slot in slots {
        let guru = guru_rows
            .iter()
            .filter(|g| g.jadwal_id == slot.id)
            .cloned()
            .collect();
        responses.push(slot_response(slot, guru)?);
    }

    let days = Hari::ALL
        .iter()
        .map(|hari| MatrixDay {
            hari: *hari,
            cells: periods
                .iter()
                .map(|period| MatrixCell {
                    jam_ke: period.jam_ke,
                    jam_mulai: format_jam(period.jam_mulai),
                    jam_selesai: format_jam(period.jam_selesai),
                    label: period.label.clone(),
                    slot: responses
                        .iter()
                        .find(|r| r.hari == *hari && r.jam_ke == period.jam_ke)
                        .cloned(),
                })
                .collect(),
        })
        .collect();

    Ok(Json(MatrixResponse {
        kelas_id: query.kelas_id,
        days,
    }))
}

/// Writes one grid cell: updates the occupying slot when the cell is
/// taken, creates a new slot when it is empty. Both paths run the full
/// mutation discipline.
#[axum::debug_handler]
pub async fn update_matrix_cell(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateJadwalRequest>,
) -> Result<Json<JadwalResponse>, AppError> {
    let draft = resolve_draft(&state.db_pool, &payload).await?;

    let occupant =
        jadwal::find_by_cell(&state.db_pool, draft.kelas_id, draft.hari, draft.jam_ke).await?;

    let (row, guru) = match occupant {
        Some(existing) => jadwal::update_slot(&state.db_pool, existing.id, &draft).await?,
        None => jadwal::create_slot(&state.db_pool, &draft).await?,
    };
    Ok(Json(slot_response(row, guru)?))
}

#[derive(Debug, Deserialize)]
pub struct CheckConflictQuery {
    pub kelas_id: Uuid,
    pub hari: String,
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    /// Comma-separated teacher ids.
    pub guru_ids: Option<String>,
    pub ruang_id: Option<Uuid>,
    /// Self-exclusion for edits of an existing cell.
    pub exclude_id: Option<Uuid>,
}

fn parse_guru_ids(raw: Option<&str>) -> Result<Vec<Uuid>, JadwalError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| JadwalError::Validation(format!("Invalid guru id '{}'", s)))
        })
        .collect()
}

/// Dry-run check for one candidate cell. Never locks, never writes.
#[axum::debug_handler]
pub async fn check_cell_conflict(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<CheckConflictQuery>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let hari = Hari::from_str(&query.hari).map_err(JadwalError::Validation)?;
    let jam_mulai = parse_jam(&query.jam_mulai).map_err(JadwalError::Validation)?;
    let jam_selesai = parse_jam(&query.jam_selesai).map_err(JadwalError::Validation)?;
    if jam_mulai >= jam_selesai {
        return Err(AppError(JadwalError::Validation(format!(
            "Start time {} must be before end time {}",
            query.jam_mulai, query.jam_selesai
        ))));
    }

    let candidate = SlotCandidate {
        id: query.exclude_id,
        kelas_id: query.kelas_id,
        hari,
        jam_ke: query.jam_ke,
        jam_mulai,
        jam_selesai,
        guru_ids: parse_guru_ids(query.guru_ids.as_deref())?,
        ruang_id: query.ruang_id,
    };
    let exclude: Vec<Uuid> = query.exclude_id.into_iter().collect();

    let report = jadwal::check_conflicts(&state.db_pool, &[candidate], &exclude).await?;
    Ok(Json(ConflictCheckResponse {
        conflict: !report.is_empty(),
        conflicts: report.conflicts,
    }))
}
