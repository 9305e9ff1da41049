//! Handlers for single-slot CRUD and co-teacher management.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use presensi_core::errors::JadwalError;
use presensi_core::models::enums::Hari;
use presensi_core::models::jadwal::{
    format_jam, AddGuruRequest, CreateJadwalRequest, GuruAssignment, JadwalResponse, SlotDraft,
};
use presensi_db::models::{DbJadwal, DbJadwalGuru};
use presensi_db::repositories::{jadwal, jam_pelajaran};

use crate::{middleware::error_handling::AppError, ApiState};

/// Resolves a request into a validated draft, filling missing times
/// from the class's period catalog (or the default template).
pub(crate) async fn resolve_draft(
    pool: &sqlx::PgPool,
    req: &CreateJadwalRequest,
) -> Result<SlotDraft, AppError> {
    if req.jam_mulai.is_some() && req.jam_selesai.is_some() {
        return Ok(SlotDraft::from_request(req)?);
    }

    let periods = jam_pelajaran::get_periods_or_default(pool, req.kelas_id).await?;
    let period = periods
        .iter()
        .find(|p| p.jam_ke == req.jam_ke)
        .ok_or_else(|| {
            JadwalError::Validation(format!(
                "No period {} in the catalog for class {}; supply jam_mulai and jam_selesai",
                req.jam_ke, req.kelas_id
            ))
        })?;

    let mut filled = req.clone();
    if filled.jam_mulai.is_none() {
        filled.jam_mulai = Some(format_jam(period.jam_mulai));
    }
    if filled.jam_selesai.is_none() {
        filled.jam_selesai = Some(format_jam(period.jam_selesai));
    }
    Ok(SlotDraft::from_request(&filled)?)
}

/// Assembles the API response shape from a stored row and its teachers.
pub(crate) fn slot_response(
    row: DbJadwal,
    guru: Vec<DbJadwalGuru>,
) -> Result<JadwalResponse, AppError> {
    let domain = row.into_domain().map_err(JadwalError::Database)?;
    let guru: Vec<GuruAssignment> = guru.iter().map(GuruAssignment::from).collect();
    Ok(JadwalResponse::from_parts(domain, guru))
}

#[derive(Debug, Deserialize)]
pub struct ListJadwalQuery {
    pub kelas_id: Option<Uuid>,
    pub hari: Option<String>,
    pub guru_id: Option<Uuid>,
    pub mapel_id: Option<Uuid>,
}

#[axum::debug_handler]
pub async fn list_jadwal(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListJadwalQuery>,
) -> Result<Json<Vec<JadwalResponse>>, AppError> {
    let hari = query
        .hari
        .as_deref()
        .map(Hari::from_str)
        .transpose()
        .map_err(JadwalError::Validation)?;

    let filter = jadwal::JadwalFilter {
        kelas_id: query.kelas_id,
        hari,
        guru_id: query.guru_id,
        mapel_id: query.mapel_id,
    };

    let slots = jadwal::list_slots(&state.db_pool, &filter).await?;
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let guru_rows = jadwal::get_guru_for_slots(&state.db_pool, &ids).await?;

    let mut responses = Vec::with_capacity(slots.len());
    for slot in slots {
        let guru: Vec<DbJadwalGuru> = guru_rows
            .iter()
            .filter(|g| g.jadwal_id == slot.id)
            .cloned()
            .collect();
        responses.push(slot_response(slot, guru)?);
    }
    Ok(Json(responses))
}

#[axum::debug_handler]
pub async fn create_jadwal(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateJadwalRequest>,
) -> Result<Json<JadwalResponse>, AppError> {
    let draft = resolve_draft(&state.db_pool, &payload).await?;
    let (row, guru) = jadwal::create_slot(&state.db_pool, &draft).await?;
    Ok(Json(slot_response(row, guru)?))
}

#[axum::debug_handler]
pub async fn update_jadwal(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateJadwalRequest>,
) -> Result<Json<JadwalResponse>, AppError> {
    let draft = resolve_draft(&state.db_pool, &payload).await?;
    let (row, guru) = jadwal::update_slot(&state.db_pool, id, &draft).await?;
    Ok(Json(slot_response(row, guru)?))
}

#[derive(Debug, Serialize)]
pub struct DeleteJadwalResponse {
    pub id: Uuid,
    pub deleted: bool,
}

#[axum::debug_handler]
pub async fn delete_jadwal(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteJadwalResponse>, AppError> {
    jadwal::deactivate_slot(&state.db_pool, id).await?;
    Ok(Json(DeleteJadwalResponse { id, deleted: true }))
}

#[axum::debug_handler]
pub async fn list_guru(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GuruAssignment>>, AppError> {
    // 404 for a slot that never existed, rather than an empty list.
    jadwal::get_slot(&state.db_pool, id)
        .await?
        .ok_or_else(|| JadwalError::NotFound(format!("Jadwal with ID {} not found", id)))?;

    let rows = jadwal::get_slot_guru(&state.db_pool, id).await?;
    Ok(Json(rows.iter().map(GuruAssignment::from).collect()))
}

#[axum::debug_handler]
pub async fn add_guru(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddGuruRequest>,
) -> Result<Json<Vec<GuruAssignment>>, AppError> {
    let rows = jadwal::add_guru(&state.db_pool, id, payload.guru_id, payload.is_primary).await?;
    Ok(Json(rows.iter().map(GuruAssignment::from).collect()))
}

#[axum::debug_handler]
pub async fn remove_guru(
    State(state): State<Arc<ApiState>>,
    Path((id, guru_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<GuruAssignment>>, AppError> {
    let rows = jadwal::remove_guru(&state.db_pool, id, guru_id).await?;
    Ok(Json(rows.iter().map(GuruAssignment::from).collect()))
}
