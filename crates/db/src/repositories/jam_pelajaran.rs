//! Period catalog repository: per-class period definitions with a
//! transactional full-replace upsert and cross-class copy.

use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use presensi_core::errors::{JadwalError, JadwalResult};
use presensi_core::models::jam_pelajaran::{default_template, PeriodDef};

use crate::models::DbJamPelajaran;
use crate::repositories::refs;

fn db_err(e: sqlx::Error) -> JadwalError {
    JadwalError::Database(eyre::Report::new(e))
}

pub async fn get_periods(
    pool: &Pool<Postgres>,
    kelas_id: Uuid,
) -> eyre::Result<Vec<DbJamPelajaran>> {
    let periods = sqlx::query_as::<_, DbJamPelajaran>(
        r#"
        SELECT id, kelas_id, jam_ke, jam_mulai, jam_selesai, label, status
        FROM jam_pelajaran
        WHERE kelas_id = $1 AND status = 'active'
        ORDER BY jam_ke
        "#,
    )
    .bind(kelas_id)
    .fetch_all(pool)
    .await?;

    Ok(periods)
}

/// Catalog rows for the class, or the default template when the class
/// has no custom rows.
pub async fn get_periods_or_default(
    pool: &Pool<Postgres>,
    kelas_id: Uuid,
) -> eyre::Result<Vec<PeriodDef>> {
    let rows = get_periods(pool, kelas_id).await?;
    if rows.is_empty() {
        return Ok(default_template());
    }
    Ok(rows
        .into_iter()
        .map(|r| PeriodDef {
            jam_ke: r.jam_ke,
            jam_mulai: r.jam_mulai,
            jam_selesai: r.jam_selesai,
            label: r.label,
        })
        .collect())
}

async fn upsert_for_class(
    tx: &mut Transaction<'_, Postgres>,
    kelas_id: Uuid,
    periods: &[PeriodDef],
) -> Result<(), sqlx::Error> {
    for period in periods {
        sqlx::query(
            r#"
            INSERT INTO jam_pelajaran (id, kelas_id, jam_ke, jam_mulai, jam_selesai, label, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            ON CONFLICT (kelas_id, jam_ke) DO UPDATE
            SET jam_mulai = EXCLUDED.jam_mulai,
                jam_selesai = EXCLUDED.jam_selesai,
                label = EXCLUDED.label,
                status = 'active'
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kelas_id)
        .bind(period.jam_ke)
        .bind(period.jam_mulai)
        .bind(period.jam_selesai)
        .bind(period.label.as_deref())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Replaces the class's whole period set in one transaction. Input is
/// expected to be pre-validated by `validate_periods`.
pub async fn upsert_periods(
    pool: &Pool<Postgres>,
    kelas_id: Uuid,
    periods: &[PeriodDef],
) -> JadwalResult<Vec<DbJamPelajaran>> {
    let kelas = refs::get_kelas(pool, kelas_id)
        .await
        .map_err(JadwalError::Database)?;
    if kelas.is_none() {
        return Err(JadwalError::NotFound(format!(
            "Kelas with ID {} not found",
            kelas_id
        )));
    }

    let mut tx = pool.begin().await.map_err(db_err)?;
    sqlx::query("DELETE FROM jam_pelajaran WHERE kelas_id = $1")
        .bind(kelas_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    upsert_for_class(&mut tx, kelas_id, periods)
        .await
        .map_err(db_err)?;
    tx.commit().await.map_err(db_err)?;

    get_periods(pool, kelas_id)
        .await
        .map_err(JadwalError::Database)
}

/// Deactivates every custom row for a class, restoring the default
/// template fallback.
pub async fn deactivate_periods(pool: &Pool<Postgres>, kelas_id: Uuid) -> JadwalResult<usize> {
    let result = sqlx::query(
        r#"
        UPDATE jam_pelajaran
        SET status = 'inactive'
        WHERE kelas_id = $1 AND status = 'active'
        "#,
    )
    .bind(kelas_id)
    .execute(pool)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(JadwalError::NotFound(format!(
            "Kelas {} has no custom periods",
            kelas_id
        )));
    }
    Ok(result.rows_affected() as usize)
}

/// Duplicates the source class's periods onto each target, overwriting
/// by (kelas_id, jam_ke). One transaction covers every target.
pub async fn copy_periods(
    pool: &Pool<Postgres>,
    source_kelas_id: Uuid,
    target_kelas_ids: &[Uuid],
) -> JadwalResult<usize> {
    if target_kelas_ids.is_empty() {
        return Err(JadwalError::Validation(
            "At least one target class is required".to_string(),
        ));
    }
    if target_kelas_ids.contains(&source_kelas_id) {
        return Err(JadwalError::Validation(
            "Cannot copy a class's periods onto itself".to_string(),
        ));
    }

    let source = get_periods(pool, source_kelas_id)
        .await
        .map_err(JadwalError::Database)?;
    if source.is_empty() {
        return Err(JadwalError::NotFound(format!(
            "Kelas {} has no periods to copy",
            source_kelas_id
        )));
    }
    let defs: Vec<PeriodDef> = source
        .into_iter()
        .map(|r| PeriodDef {
            jam_ke: r.jam_ke,
            jam_mulai: r.jam_mulai,
            jam_selesai: r.jam_selesai,
            label: r.label,
        })
        .collect();

    for target in target_kelas_ids {
        if refs::get_kelas(pool, *target)
            .await
            .map_err(JadwalError::Database)?
            .is_none()
        {
            return Err(JadwalError::NotFound(format!(
                "Kelas with ID {} not found",
                target
            )));
        }
    }

    let mut tx = pool.begin().await.map_err(db_err)?;
    for target in target_kelas_ids {
        upsert_for_class(&mut tx, *target, &defs)
            .await
            .map_err(db_err)?;
    }
    tx.commit().await.map_err(db_err)?;

    tracing::info!(
        "Copied {} periods from kelas {} to {} target(s)",
        defs.len(),
        source_kelas_id,
        target_kelas_ids.len()
    );
    Ok(defs.len() * target_kelas_ids.len())
}
