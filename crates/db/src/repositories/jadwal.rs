//! Schedule store and mutation operators.
//!
//! Every mutating path follows the same discipline: one transaction,
//! `SELECT ... FOR UPDATE` over the active rows of every day the
//! candidate set touches, a conflict-detector pass, then the writes.
//! The partial unique index on (kelas_id, hari, jam_ke) is the
//! fallback guard; a 23505 raised by a concurrent writer is surfaced
//! as a conflict, not a generic database error.

use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use presensi_core::conflict::{
    find_conflicts, Conflict, ConflictKind, ConflictParty, ConflictReport, SlotCandidate,
};
use presensi_core::errors::{JadwalError, JadwalResult};
use presensi_core::models::enums::Hari;
use presensi_core::models::jadwal::{
    clone_week_drafts, format_jam, validate_clone_targets, SlotDraft,
};

use crate::models::{DbJadwal, DbJadwalGuru, DbJadwalWithGuru};
use crate::repositories::refs;

fn db_err(e: sqlx::Error) -> JadwalError {
    JadwalError::Database(eyre::Report::new(e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Report for a uniqueness violation raised during commit: another
/// writer took the slot between our check and our write. `index` is
/// the draft's position in its batch, 0 for single-slot paths.
pub fn race_conflict(draft: &SlotDraft, index: usize) -> JadwalError {
    let party = ConflictParty {
        jadwal_id: None,
        candidate_index: Some(index),
        kelas_id: draft.kelas_id,
        jam_ke: draft.jam_ke,
        jam_mulai: format_jam(draft.jam_mulai),
        jam_selesai: format_jam(draft.jam_selesai),
    };
    JadwalError::Conflict(ConflictReport {
        conflicts: vec![Conflict {
            kind: ConflictKind::ClassConflict,
            hari: draft.hari,
            resource_id: draft.kelas_id,
            candidate: party.clone(),
            other: party,
            message: format!(
                "Slot (kelas {}, {}, jam ke-{}) was booked by a concurrent update",
                draft.kelas_id, draft.hari, draft.jam_ke
            ),
        }],
    })
}

fn day_strings(drafts: &[SlotDraft]) -> Vec<String> {
    let mut days: Vec<String> = drafts.iter().map(|d| d.hari.to_string()).collect();
    days.sort();
    days.dedup();
    days
}

/// Row-locks every active slot on the given days for the duration of
/// the transaction, closing the check-then-write race.
async fn lock_days(tx: &mut Transaction<'_, Postgres>, days: &[String]) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        SELECT id FROM jadwal
        WHERE status = 'active' AND hari = ANY($1)
        FOR UPDATE
        "#,
    )
    .bind(days)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

const CONFLICT_SET_SQL: &str = r#"
    SELECT j.id, j.kelas_id, j.hari, j.jam_ke, j.jam_mulai, j.jam_selesai, j.ruang_id,
           COALESCE(array_agg(g.guru_id) FILTER (WHERE g.guru_id IS NOT NULL),
                    ARRAY[]::uuid[]) AS guru_ids
    FROM jadwal j
    LEFT JOIN jadwal_guru g ON g.jadwal_id = j.id
    WHERE j.status = 'active' AND j.hari = ANY($1)
    GROUP BY j.id
    ORDER BY j.kelas_id, j.hari, j.jam_ke
"#;

async fn load_conflict_set_tx(
    tx: &mut Transaction<'_, Postgres>,
    days: &[String],
) -> JadwalResult<Vec<SlotCandidate>> {
    let rows = sqlx::query_as::<_, DbJadwalWithGuru>(CONFLICT_SET_SQL)
        .bind(days)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;
    rows.into_iter()
        .map(|row| row.into_candidate().map_err(JadwalError::Database))
        .collect()
}

/// Detector view of every active slot on the given days. Used by the
/// check-only paths and the import pipeline's pre-screen.
pub async fn load_active_candidates(
    pool: &Pool<Postgres>,
    days: &[String],
) -> JadwalResult<Vec<SlotCandidate>> {
    let rows = sqlx::query_as::<_, DbJadwalWithGuru>(CONFLICT_SET_SQL)
        .bind(days)
        .fetch_all(pool)
        .await
        .map_err(db_err)?;
    rows.into_iter()
        .map(|row| row.into_candidate().map_err(JadwalError::Database))
        .collect()
}

async fn insert_slot(
    tx: &mut Transaction<'_, Postgres>,
    draft: &SlotDraft,
) -> Result<(DbJadwal, Vec<DbJadwalGuru>), sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Inserting jadwal: id={}, kelas={}, hari={}, jam_ke={}",
        id,
        draft.kelas_id,
        draft.hari,
        draft.jam_ke
    );

    let jadwal = sqlx::query_as::<_, DbJadwal>(
        r#"
        INSERT INTO jadwal (id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
                            jenis_aktivitas, mapel_id, ruang_id, catatan, status,
                            created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'active', $11, $11)
        RETURNING id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
                  jenis_aktivitas, mapel_id, ruang_id, catatan, status,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(draft.kelas_id)
    .bind(draft.hari.to_string())
    .bind(draft.jam_ke)
    .bind(draft.jam_mulai)
    .bind(draft.jam_selesai)
    .bind(draft.jenis_aktivitas.to_string())
    .bind(draft.mapel_id)
    .bind(draft.ruang_id)
    .bind(draft.catatan.as_deref())
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    let guru = replace_guru(tx, id, &draft.guru_ids).await?;
    Ok((jadwal, guru))
}

/// Rewrites the co-teacher rows for a slot; the first id is primary.
async fn replace_guru(
    tx: &mut Transaction<'_, Postgres>,
    jadwal_id: Uuid,
    guru_ids: &[Uuid],
) -> Result<Vec<DbJadwalGuru>, sqlx::Error> {
    sqlx::query("DELETE FROM jadwal_guru WHERE jadwal_id = $1")
        .bind(jadwal_id)
        .execute(&mut **tx)
        .await?;

    let mut rows = Vec::with_capacity(guru_ids.len());
    for (i, guru_id) in guru_ids.iter().enumerate() {
        let row = sqlx::query_as::<_, DbJadwalGuru>(
            r#"
            INSERT INTO jadwal_guru (jadwal_id, guru_id, is_primary)
            VALUES ($1, $2, $3)
            ON CONFLICT (jadwal_id, guru_id) DO NOTHING
            RETURNING jadwal_id, guru_id, is_primary
            "#,
        )
        .bind(jadwal_id)
        .bind(guru_id)
        .bind(i == 0)
        .fetch_optional(&mut **tx)
        .await?;
        if let Some(row) = row {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Filter for `GET /jadwal`.
#[derive(Debug, Clone, Default)]
pub struct JadwalFilter {
    pub kelas_id: Option<Uuid>,
    pub hari: Option<Hari>,
    pub guru_id: Option<Uuid>,
    pub mapel_id: Option<Uuid>,
}

pub async fn list_slots(
    pool: &Pool<Postgres>,
    filter: &JadwalFilter,
) -> eyre::Result<Vec<DbJadwal>> {
    let slots = sqlx::query_as::<_, DbJadwal>(
        r#"
        SELECT id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
               jenis_aktivitas, mapel_id, ruang_id, catatan, status,
               created_at, updated_at
        FROM jadwal
        WHERE status = 'active'
          AND ($1::uuid IS NULL OR kelas_id = $1)
          AND ($2::text IS NULL OR hari = $2)
          AND ($3::uuid IS NULL OR mapel_id = $3)
          AND ($4::uuid IS NULL OR id IN
               (SELECT jadwal_id FROM jadwal_guru WHERE guru_id = $4))
        ORDER BY kelas_id, hari, jam_ke
        "#,
    )
    .bind(filter.kelas_id)
    .bind(filter.hari.map(|h| h.to_string()))
    .bind(filter.mapel_id)
    .bind(filter.guru_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn get_slot(pool: &Pool<Postgres>, id: Uuid) -> eyre::Result<Option<DbJadwal>> {
    let slot = sqlx::query_as::<_, DbJadwal>(
        r#"
        SELECT id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
               jenis_aktivitas, mapel_id, ruang_id, catatan, status,
               created_at, updated_at
        FROM jadwal
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn get_slot_guru(pool: &Pool<Postgres>, jadwal_id: Uuid) -> eyre::Result<Vec<DbJadwalGuru>> {
    let rows = sqlx::query_as::<_, DbJadwalGuru>(
        r#"
        SELECT jadwal_id, guru_id, is_primary
        FROM jadwal_guru
        WHERE jadwal_id = $1
        ORDER BY is_primary DESC, guru_id
        "#,
    )
    .bind(jadwal_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Teacher rows for a whole set of slots, for list/matrix responses.
pub async fn get_guru_for_slots(
    pool: &Pool<Postgres>,
    jadwal_ids: &[Uuid],
) -> eyre::Result<Vec<DbJadwalGuru>> {
    let rows = sqlx::query_as::<_, DbJadwalGuru>(
        r#"
        SELECT jadwal_id, guru_id, is_primary
        FROM jadwal_guru
        WHERE jadwal_id = ANY($1)
        ORDER BY jadwal_id, is_primary DESC, guru_id
        "#,
    )
    .bind(jadwal_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates one slot. Aborts with the full conflict report when the
/// candidate collides with any committed row.
pub async fn create_slot(
    pool: &Pool<Postgres>,
    draft: &SlotDraft,
) -> JadwalResult<(DbJadwal, Vec<DbJadwalGuru>)> {
    draft.validate()?;
    refs::ensure_refs(pool, std::slice::from_ref(draft)).await?;

    let days = day_strings(std::slice::from_ref(draft));
    let mut tx = pool.begin().await.map_err(db_err)?;
    lock_days(&mut tx, &days).await.map_err(db_err)?;

    let existing = load_conflict_set_tx(&mut tx, &days).await?;
    let report = find_conflicts(&[draft.candidate(None)], &existing, &[]);
    if !report.is_empty() {
        return Err(JadwalError::Conflict(report));
    }

    let created = insert_slot(&mut tx, draft).await.map_err(|e| {
        if is_unique_violation(&e) {
            race_conflict(draft, 0)
        } else {
            db_err(e)
        }
    })?;

    tx.commit().await.map_err(db_err)?;
    Ok(created)
}

/// Updates one slot in place, self-excluding it from the check.
pub async fn update_slot(
    pool: &Pool<Postgres>,
    id: Uuid,
    draft: &SlotDraft,
) -> JadwalResult<(DbJadwal, Vec<DbJadwalGuru>)> {
    draft.validate()?;
    let current = get_slot(pool, id)
        .await
        .map_err(JadwalError::Database)?
        .ok_or_else(|| JadwalError::NotFound(format!("Jadwal with ID {} not found", id)))?;
    refs::ensure_refs(pool, std::slice::from_ref(draft)).await?;

    // Lock both the old and the new day when the slot moves.
    let mut days = vec![current.hari.clone(), draft.hari.to_string()];
    days.sort();
    days.dedup();

    let mut tx = pool.begin().await.map_err(db_err)?;
    lock_days(&mut tx, &days).await.map_err(db_err)?;

    let existing = load_conflict_set_tx(&mut tx, &days).await?;
    let report = find_conflicts(&[draft.candidate(Some(id))], &existing, &[id]);
    if !report.is_empty() {
        return Err(JadwalError::Conflict(report));
    }

    let updated = sqlx::query_as::<_, DbJadwal>(
        r#"
        UPDATE jadwal
        SET kelas_id = $2, hari = $3, jam_ke = $4, jam_mulai = $5, jam_selesai = $6,
            jenis_aktivitas = $7, mapel_id = $8, ruang_id = $9, catatan = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
                  jenis_aktivitas, mapel_id, ruang_id, catatan, status,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(draft.kelas_id)
    .bind(draft.hari.to_string())
    .bind(draft.jam_ke)
    .bind(draft.jam_mulai)
    .bind(draft.jam_selesai)
    .bind(draft.jenis_aktivitas.to_string())
    .bind(draft.mapel_id)
    .bind(draft.ruang_id)
    .bind(draft.catatan.as_deref())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            race_conflict(draft, 0)
        } else {
            db_err(e)
        }
    })?;

    let guru = replace_guru(&mut tx, id, &draft.guru_ids)
        .await
        .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    Ok((updated, guru))
}

/// Soft delete. Attendance rows keep referencing the deactivated slot.
pub async fn deactivate_slot(pool: &Pool<Postgres>, id: Uuid) -> JadwalResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE jadwal
        SET status = 'inactive', updated_at = NOW()
        WHERE id = $1 AND status = 'active'
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(JadwalError::NotFound(format!(
            "Active jadwal with ID {} not found",
            id
        )));
    }
    Ok(())
}

/// Commits N candidate slots or none: one transaction, one detector
/// pass over the batch plus the committed rows of every touched day.
pub async fn bulk_create(
    pool: &Pool<Postgres>,
    drafts: &[SlotDraft],
) -> JadwalResult<Vec<(DbJadwal, Vec<DbJadwalGuru>)>> {
    if drafts.is_empty() {
        return Err(JadwalError::Validation(
            "At least one slot is required".to_string(),
        ));
    }
    for draft in drafts {
        draft.validate()?;
    }
    refs::ensure_refs(pool, drafts).await?;

    let days = day_strings(drafts);
    let mut tx = pool.begin().await.map_err(db_err)?;
    lock_days(&mut tx, &days).await.map_err(db_err)?;

    let existing = load_conflict_set_tx(&mut tx, &days).await?;
    let candidates: Vec<SlotCandidate> = drafts.iter().map(|d| d.candidate(None)).collect();
    let report = find_conflicts(&candidates, &existing, &[]);
    if !report.is_empty() {
        return Err(JadwalError::Conflict(report));
    }

    let mut created = Vec::with_capacity(drafts.len());
    for (i, draft) in drafts.iter().enumerate() {
        let row = insert_slot(&mut tx, draft).await.map_err(|e| {
            if is_unique_violation(&e) {
                race_conflict(draft, i)
            } else {
                db_err(e)
            }
        })?;
        created.push(row);
    }

    tx.commit().await.map_err(db_err)?;
    tracing::info!("Bulk-created {} jadwal rows", created.len());
    Ok(created)
}

/// Clones the source class's active week onto each target class,
/// applying the optional teacher/room remaps, through the same
/// all-or-nothing path as `bulk_create`.
pub async fn clone_week(
    pool: &Pool<Postgres>,
    source_kelas_id: Uuid,
    target_kelas_ids: &[Uuid],
    guru_remap: &std::collections::HashMap<Uuid, Uuid>,
    ruang_remap: &std::collections::HashMap<Uuid, Uuid>,
) -> JadwalResult<Vec<(DbJadwal, Vec<DbJadwalGuru>)>> {
    validate_clone_targets(source_kelas_id, target_kelas_ids)?;

    let source_slots = list_slots(
        pool,
        &JadwalFilter {
            kelas_id: Some(source_kelas_id),
            ..Default::default()
        },
    )
    .await
    .map_err(JadwalError::Database)?;
    if source_slots.is_empty() {
        return Err(JadwalError::NotFound(format!(
            "Class {} has no active schedule to clone",
            source_kelas_id
        )));
    }

    let ids: Vec<Uuid> = source_slots.iter().map(|s| s.id).collect();
    let guru_rows = get_guru_for_slots(pool, &ids)
        .await
        .map_err(JadwalError::Database)?;

    // (slot, teacher ids primary-first), the shape clone_week_drafts
    // expects; get_guru_for_slots already orders is_primary DESC.
    let mut source = Vec::with_capacity(source_slots.len());
    for slot in source_slots {
        let guru_ids: Vec<Uuid> = guru_rows
            .iter()
            .filter(|g| g.jadwal_id == slot.id)
            .map(|g| g.guru_id)
            .collect();
        let jadwal = slot.into_domain().map_err(JadwalError::Database)?;
        source.push((jadwal, guru_ids));
    }

    let drafts = clone_week_drafts(&source, target_kelas_ids, guru_remap, ruang_remap);
    bulk_create(pool, &drafts).await
}

/// Dry-run conflict check: plain read, no transaction, no locks,
/// never mutates.
pub async fn check_conflicts(
    pool: &Pool<Postgres>,
    candidates: &[SlotCandidate],
    exclude_ids: &[Uuid],
) -> JadwalResult<ConflictReport> {
    let mut days: Vec<String> = candidates.iter().map(|c| c.hari.to_string()).collect();
    days.sort();
    days.dedup();

    let existing = load_active_candidates(pool, &days).await?;
    Ok(find_conflicts(candidates, &existing, exclude_ids))
}

/// The active slot occupying one matrix cell, if any.
pub async fn find_by_cell(
    pool: &Pool<Postgres>,
    kelas_id: Uuid,
    hari: Hari,
    jam_ke: i16,
) -> eyre::Result<Option<DbJadwal>> {
    let slot = sqlx::query_as::<_, DbJadwal>(
        r#"
        SELECT id, kelas_id, hari, jam_ke, jam_mulai, jam_selesai,
               jenis_aktivitas, mapel_id, ruang_id, catatan, status,
               created_at, updated_at
        FROM jadwal
        WHERE kelas_id = $1 AND hari = $2 AND jam_ke = $3 AND status = 'active'
        "#,
    )
    .bind(kelas_id)
    .bind(hari.to_string())
    .bind(jam_ke)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Assigns an additional teacher to a slot after re-running the
/// detector for the slot's time window.
pub async fn add_guru(
    pool: &Pool<Postgres>,
    jadwal_id: Uuid,
    guru_id: Uuid,
    is_primary: bool,
) -> JadwalResult<Vec<DbJadwalGuru>> {
    let slot = get_slot(pool, jadwal_id)
        .await
        .map_err(JadwalError::Database)?
        .ok_or_else(|| JadwalError::NotFound(format!("Jadwal with ID {} not found", jadwal_id)))?;

    let jadwal = slot.into_domain().map_err(JadwalError::Database)?;
    let candidate = SlotCandidate {
        id: Some(jadwal_id),
        kelas_id: jadwal.kelas_id,
        hari: jadwal.hari,
        jam_ke: jadwal.jam_ke,
        jam_mulai: jadwal.jam_mulai,
        jam_selesai: jadwal.jam_selesai,
        guru_ids: vec![guru_id],
        ruang_id: None,
    };

    let days = vec![jadwal.hari.to_string()];
    let mut tx = pool.begin().await.map_err(db_err)?;
    lock_days(&mut tx, &days).await.map_err(db_err)?;

    let existing = load_conflict_set_tx(&mut tx, &days).await?;
    let report = find_conflicts(&[candidate], &existing, &[jadwal_id]);
    if !report.is_empty() {
        return Err(JadwalError::Conflict(report));
    }

    if is_primary {
        sqlx::query("UPDATE jadwal_guru SET is_primary = FALSE WHERE jadwal_id = $1")
            .bind(jadwal_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO jadwal_guru (jadwal_id, guru_id, is_primary)
        VALUES ($1, $2, $3)
        ON CONFLICT (jadwal_id, guru_id) DO NOTHING
        "#,
    )
    .bind(jadwal_id)
    .bind(guru_id)
    .bind(is_primary)
    .execute(&mut *tx)
    .await
    .map_err(db_err)?;
    if inserted.rows_affected() == 0 {
        return Err(JadwalError::Validation(format!(
            "Teacher {} is already assigned to this slot",
            guru_id
        )));
    }

    tx.commit().await.map_err(db_err)?;
    get_slot_guru(pool, jadwal_id)
        .await
        .map_err(JadwalError::Database)
}

/// Removes a co-teacher. A lesson slot keeps at least one teacher;
/// when the primary leaves, the first remaining assignment is
/// promoted.
pub async fn remove_guru(
    pool: &Pool<Postgres>,
    jadwal_id: Uuid,
    guru_id: Uuid,
) -> JadwalResult<Vec<DbJadwalGuru>> {
    let slot = get_slot(pool, jadwal_id)
        .await
        .map_err(JadwalError::Database)?
        .ok_or_else(|| JadwalError::NotFound(format!("Jadwal with ID {} not found", jadwal_id)))?;

    let current = get_slot_guru(pool, jadwal_id)
        .await
        .map_err(JadwalError::Database)?;
    let target = current
        .iter()
        .find(|g| g.guru_id == guru_id)
        .ok_or_else(|| {
            JadwalError::NotFound(format!(
                "Teacher {} is not assigned to jadwal {}",
                guru_id, jadwal_id
            ))
        })?
        .clone();

    if slot.jenis_aktivitas == "lesson" && current.len() == 1 {
        return Err(JadwalError::Validation(
            "A lesson slot requires at least one teacher".to_string(),
        ));
    }

    let mut tx = pool.begin().await.map_err(db_err)?;
    sqlx::query("DELETE FROM jadwal_guru WHERE jadwal_id = $1 AND guru_id = $2")
        .bind(jadwal_id)
        .bind(guru_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

    if target.is_primary {
        sqlx::query(
            r#"
            UPDATE jadwal_guru SET is_primary = TRUE
            WHERE jadwal_id = $1 AND guru_id =
                  (SELECT guru_id FROM jadwal_guru WHERE jadwal_id = $1
                   ORDER BY guru_id LIMIT 1)
            "#,
        )
        .bind(jadwal_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    }

    tx.commit().await.map_err(db_err)?;
    get_slot_guru(pool, jadwal_id)
        .await
        .map_err(JadwalError::Database)
}
