//! Spreadsheet import endpoint.
//!
//! The pure stages (shape detection, per-row validation) live in
//! `presensi_core::import`; this handler does the I/O: multipart
//! extraction, CSV decoding, name-directory loading, the conflict
//! screen against the committed rows, and the final bulk commit.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use presensi_core::conflict::SlotCandidate;
use presensi_core::errors::JadwalError;
use presensi_core::import::{
    admit_rows, collect_rows, detect_format, flag_conflicting_rows, normalize_header,
    raw_row_from_fields, screen_references, ImportPreviewRow, ImportReport, NameDirectory, RawRow,
    RowFormat,
};
use presensi_core::models::jadwal::SlotDraft;
use presensi_db::repositories::{jadwal, refs};

use crate::{middleware::error_handling::AppError, ApiState};

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(rename = "dryRun", default)]
    pub dry_run: bool,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JadwalError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| JadwalError::Validation(format!("Failed to read upload: {}", e)))?;
            return Ok(data.to_vec());
        }
    }
    Err(AppError(JadwalError::Validation(
        "Missing 'file' field in multipart body".to_string(),
    )))
}

/// Decodes the CSV into tagged raw rows. Row numbers are 1-based with
/// the header on row 1, matching the user's spreadsheet view.
fn decode_csv(data: &[u8], max_rows: usize) -> Result<(RowFormat, Vec<(usize, RawRow)>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| JadwalError::Validation(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();
    let format = detect_format(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row_number = i + 2;
        let record = record.map_err(|e| {
            JadwalError::Validation(format!("Row {}: unreadable CSV record: {}", row_number, e))
        })?;
        let map: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push((row_number, raw_row_from_fields(format, &map)));
    }

    if rows.is_empty() {
        return Err(AppError(JadwalError::Validation(
            "The file contains no data rows".to_string(),
        )));
    }
    if rows.len() > max_rows {
        return Err(AppError(JadwalError::Validation(format!(
            "File has {} rows, the maximum is {}",
            rows.len(),
            max_rows
        ))));
    }
    Ok((format, rows))
}

/// Detector view of every committed row on the days the batch
/// touches.
async fn load_existing(
    pool: &sqlx::PgPool,
    valid: &[(usize, SlotDraft)],
) -> Result<Vec<SlotCandidate>, AppError> {
    if valid.is_empty() {
        return Ok(Vec::new());
    }
    let mut days: Vec<String> = valid.iter().map(|(_, d)| d.hari.to_string()).collect();
    days.sort();
    days.dedup();
    Ok(jadwal::load_active_candidates(pool, &days).await?)
}

#[axum::debug_handler]
pub async fn import_master(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let data = read_file_field(&mut multipart).await?;
    let (format, rows) = decode_csv(&data, state.max_import_rows)?;

    // The name-based shape resolves display names against active rows.
    let directory = match format {
        RowFormat::ByName => refs::load_name_directory(&state.db_pool).await?,
        RowFormat::ById => NameDirectory::new(),
    };

    let total = rows.len();
    let (valid, mut errors) = collect_rows(&rows, &directory);

    // The id-based shape resolves raw ids against active rows, so an
    // unknown reference fails its row the same way an unresolved name
    // does.
    let valid = match format {
        RowFormat::ById if !valid.is_empty() => {
            let drafts: Vec<SlotDraft> = valid.iter().map(|(_, d)| d.clone()).collect();
            let ids = refs::load_id_directory(&state.db_pool, &drafts).await?;
            let (valid, ref_errors) = screen_references(valid, &ids);
            errors.extend(ref_errors);
            valid
        }
        _ => valid,
    };

    let existing = load_existing(&state.db_pool, &valid).await?;
    // Dry-run evaluates the batch as a whole; commit admits rows in
    // file order so the earlier of two clashing rows still lands.
    let (clean, conflict_errors) = if query.dry_run {
        flag_conflicting_rows(valid, &existing)
    } else {
        admit_rows(valid, &existing)
    };
    errors.extend(conflict_errors);
    errors.sort_by_key(|e| e.row);

    if query.dry_run {
        let preview: Vec<ImportPreviewRow> = clean
            .iter()
            .map(|(row, draft)| ImportPreviewRow::from_draft(*row, draft))
            .collect();
        let report = ImportReport {
            total,
            valid: clean.len(),
            invalid: total - clean.len(),
            errors,
            preview_data: Some(preview),
            message: format!("Dry run: {} of {} row(s) importable", clean.len(), total),
        };
        return Ok(Json(report).into_response());
    }

    if clean.is_empty() {
        let report = ImportReport {
            total,
            valid: 0,
            invalid: total,
            errors,
            preview_data: None,
            message: "Import rejected: no valid rows".to_string(),
        };
        return Ok((StatusCode::BAD_REQUEST, Json(report)).into_response());
    }

    let drafts: Vec<SlotDraft> = clean.iter().map(|(_, d)| d.clone()).collect();
    let created = jadwal::bulk_create(&state.db_pool, &drafts).await?;
    tracing::info!("Imported {} of {} spreadsheet row(s)", created.len(), total);

    let report = ImportReport {
        total,
        valid: created.len(),
        invalid: total - created.len(),
        errors,
        preview_data: None,
        message: format!("Imported {} of {} row(s)", created.len(), total),
    };
    Ok(Json(report).into_response())
}
