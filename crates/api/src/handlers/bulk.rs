//! Batch mutation handlers: bulk create, week cloning, and the
//! dry-run bulk conflict check. Every write path is all-or-nothing.

use std::sync::Arc;

use axum::{extract::State, Json};
use uuid::Uuid;

use presensi_core::conflict::SlotCandidate;
use presensi_core::errors::JadwalError;
use presensi_core::models::jadwal::{
    BulkCreateRequest, BulkCreateResponse, CloneWeekRequest, ConflictCheckResponse, SlotDraft,
};
use presensi_db::repositories::jadwal;

use crate::handlers::jadwal::{resolve_draft, slot_response};
use crate::{middleware::error_handling::AppError, ApiState};

fn enforce_batch_cap(len: usize, cap: usize) -> Result<(), AppError> {
    if len > cap {
        return Err(AppError(JadwalError::Validation(format!(
            "Batch of {} slots exceeds the maximum of {}",
            len, cap
        ))));
    }
    Ok(())
}

async fn resolve_batch(
    state: &ApiState,
    request: &BulkCreateRequest,
) -> Result<Vec<SlotDraft>, AppError> {
    if request.slots.is_empty() {
        return Err(AppError(JadwalError::Validation(
            "At least one slot is required".to_string(),
        )));
    }
    enforce_batch_cap(request.slots.len(), state.max_import_rows)?;

    let mut drafts = Vec::with_capacity(request.slots.len());
    for slot in &request.slots {
        drafts.push(resolve_draft(&state.db_pool, slot).await?);
    }
    Ok(drafts)
}

#[axum::debug_handler]
pub async fn bulk_create(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    let drafts = resolve_batch(&state, &payload).await?;
    let created = jadwal::bulk_create(&state.db_pool, &drafts).await?;

    let mut slots = Vec::with_capacity(created.len());
    for (row, guru) in created {
        slots.push(slot_response(row, guru)?);
    }
    Ok(Json(BulkCreateResponse {
        created: slots.len(),
        slots,
    }))
}

#[axum::debug_handler]
pub async fn clone_week(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CloneWeekRequest>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    let created = jadwal::clone_week(
        &state.db_pool,
        payload.source_kelas_id,
        &payload.target_kelas_ids,
        &payload.guru_remap,
        &payload.ruang_remap,
    )
    .await?;

    let mut slots = Vec::with_capacity(created.len());
    for (row, guru) in created {
        slots.push(slot_response(row, guru)?);
    }
    Ok(Json(BulkCreateResponse {
        created: slots.len(),
        slots,
    }))
}

/// Dry-run conflict check over a candidate batch. Reads the committed
/// rows with a plain query and never writes.
#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    let drafts = resolve_batch(&state, &payload).await?;
    let candidates: Vec<SlotCandidate> = drafts.iter().map(|d| d.candidate(None)).collect();
    let exclude: Vec<Uuid> = Vec::new();

    let report = jadwal::check_conflicts(&state.db_pool, &candidates, &exclude).await?;
    Ok(Json(ConflictCheckResponse {
        conflict: !report.is_empty(),
        conflicts: report.conflicts,
    }))
}
