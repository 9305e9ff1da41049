//! Period catalog handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use presensi_core::models::jadwal::format_jam;
use presensi_core::models::jam_pelajaran::{
    default_template, validate_periods, CopyPeriodsRequest, PeriodResponse, UpsertPeriodsRequest,
};
use presensi_db::models::DbJamPelajaran;
use presensi_db::repositories::jam_pelajaran;

use crate::{middleware::error_handling::AppError, ApiState};

fn row_response(row: &DbJamPelajaran) -> PeriodResponse {
    PeriodResponse {
        jam_ke: row.jam_ke,
        jam_mulai: format_jam(row.jam_mulai),
        jam_selesai: format_jam(row.jam_selesai),
        label: row.label.clone(),
    }
}

/// The class's catalog, falling back to the default template when no
/// custom rows exist.
#[axum::debug_handler]
pub async fn get_periods(
    State(state): State<Arc<ApiState>>,
    Path(kelas_id): Path<Uuid>,
) -> Result<Json<Vec<PeriodResponse>>, AppError> {
    let periods = jam_pelajaran::get_periods_or_default(&state.db_pool, kelas_id).await?;
    Ok(Json(periods.iter().map(PeriodResponse::from).collect()))
}

/// Full replace of the class's period set.
#[axum::debug_handler]
pub async fn upsert_periods(
    State(state): State<Arc<ApiState>>,
    Path(kelas_id): Path<Uuid>,
    Json(payload): Json<UpsertPeriodsRequest>,
) -> Result<Json<Vec<PeriodResponse>>, AppError> {
    let defs = validate_periods(&payload.periods)?;
    let rows = jam_pelajaran::upsert_periods(&state.db_pool, kelas_id, &defs).await?;
    Ok(Json(rows.iter().map(row_response).collect()))
}

#[derive(Debug, Serialize)]
pub struct DeletePeriodsResponse {
    pub kelas_id: Uuid,
    pub deactivated: usize,
}

/// Deactivates the class's custom rows; lookups fall back to the
/// default template afterwards.
#[axum::debug_handler]
pub async fn delete_periods(
    State(state): State<Arc<ApiState>>,
    Path(kelas_id): Path<Uuid>,
) -> Result<Json<DeletePeriodsResponse>, AppError> {
    let deactivated = jam_pelajaran::deactivate_periods(&state.db_pool, kelas_id).await?;
    Ok(Json(DeletePeriodsResponse {
        kelas_id,
        deactivated,
    }))
}

#[derive(Debug, Serialize)]
pub struct CopyPeriodsResponse {
    pub copied: usize,
}

#[axum::debug_handler]
pub async fn copy_periods(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CopyPeriodsRequest>,
) -> Result<Json<CopyPeriodsResponse>, AppError> {
    let copied = jam_pelajaran::copy_periods(
        &state.db_pool,
        payload.source_kelas_id,
        &payload.target_kelas_ids,
    )
    .await?;
    Ok(Json(CopyPeriodsResponse { copied }))
}

/// The built-in template, for seeding a new class's catalog in the UI.
#[axum::debug_handler]
pub async fn get_default_template(
    State(_state): State<Arc<ApiState>>,
) -> Result<Json<Vec<PeriodResponse>>, AppError> {
    let periods = default_template();
    Ok(Json(periods.iter().map(PeriodResponse::from).collect()))
}
