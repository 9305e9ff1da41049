use std::collections::HashSet;

use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use presensi_core::errors::{JadwalError, JadwalResult};
use presensi_core::import::{IdDirectory, NameDirectory};
use presensi_core::models::jadwal::SlotDraft;

use crate::models::{DbGuru, DbKelas, DbMapel, DbRuang};

pub async fn get_kelas(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbKelas>> {
    let kelas = sqlx::query_as::<_, DbKelas>(
        r#"
        SELECT id, nama, tingkat, status
        FROM kelas
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(kelas)
}

async fn active_ids(
    pool: &Pool<Postgres>,
    table: &str,
    ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    // Table names come from a fixed internal list, never from input.
    let sql = format!(
        "SELECT id FROM {} WHERE id = ANY($1) AND status = 'active'",
        table
    );
    let rows: Vec<(Uuid,)> = sqlx::query_as(&sql).bind(ids).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

fn db_err(e: sqlx::Error) -> JadwalError {
    JadwalError::Database(eyre::Report::new(e))
}

/// Verifies every reference a draft set points at exists and is
/// active, before any write happens.
pub async fn ensure_refs(pool: &Pool<Postgres>, drafts: &[SlotDraft]) -> JadwalResult<()> {
    let mut kelas: HashSet<Uuid> = HashSet::new();
    let mut guru: HashSet<Uuid> = HashSet::new();
    let mut mapel: HashSet<Uuid> = HashSet::new();
    let mut ruang: HashSet<Uuid> = HashSet::new();
    for draft in drafts {
        kelas.insert(draft.kelas_id);
        guru.extend(draft.guru_ids.iter().copied());
        mapel.extend(draft.mapel_id);
        ruang.extend(draft.ruang_id);
    }

    for (table, wanted, label) in [
        ("kelas", &kelas, "class"),
        ("guru", &guru, "teacher"),
        ("mapel", &mapel, "subject"),
        ("ruang", &ruang, "room"),
    ] {
        if wanted.is_empty() {
            continue;
        }
        let ids: Vec<Uuid> = wanted.iter().copied().collect();
        let found = active_ids(pool, table, &ids).await.map_err(db_err)?;
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(JadwalError::NotFound(format!(
                "Active {} with ID {} not found",
                label, missing
            )));
        }
    }

    Ok(())
}

/// Loads the active-id lookup for the id-based import format, scoped
/// to the ids a draft set actually references.
pub async fn load_id_directory(pool: &Pool<Postgres>, drafts: &[SlotDraft]) -> Result<IdDirectory> {
    let mut kelas: HashSet<Uuid> = HashSet::new();
    let mut guru: HashSet<Uuid> = HashSet::new();
    let mut mapel: HashSet<Uuid> = HashSet::new();
    let mut ruang: HashSet<Uuid> = HashSet::new();
    for draft in drafts {
        kelas.insert(draft.kelas_id);
        guru.extend(draft.guru_ids.iter().copied());
        mapel.extend(draft.mapel_id);
        ruang.extend(draft.ruang_id);
    }

    let mut directory = IdDirectory::new();
    if !kelas.is_empty() {
        let ids: Vec<Uuid> = kelas.into_iter().collect();
        for id in active_ids(pool, "kelas", &ids).await? {
            directory.add_kelas(id);
        }
    }
    if !guru.is_empty() {
        let ids: Vec<Uuid> = guru.into_iter().collect();
        for id in active_ids(pool, "guru", &ids).await? {
            directory.add_guru(id);
        }
    }
    if !mapel.is_empty() {
        let ids: Vec<Uuid> = mapel.into_iter().collect();
        for id in active_ids(pool, "mapel", &ids).await? {
            directory.add_mapel(id);
        }
    }
    if !ruang.is_empty() {
        let ids: Vec<Uuid> = ruang.into_iter().collect();
        for id in active_ids(pool, "ruang", &ids).await? {
            directory.add_ruang(id);
        }
    }
    Ok(directory)
}

/// Loads the display-name lookup used by the name-based import format.
/// Only active rows participate.
pub async fn load_name_directory(pool: &Pool<Postgres>) -> Result<NameDirectory> {
    let mut directory = NameDirectory::new();

    let kelas = sqlx::query_as::<_, DbKelas>(
        "SELECT id, nama, tingkat, status FROM kelas WHERE status = 'active'",
    )
    .fetch_all(pool)
    .await?;
    for row in kelas {
        directory.add_kelas(&row.nama, row.id);
    }

    let guru =
        sqlx::query_as::<_, DbGuru>("SELECT id, nama, status FROM guru WHERE status = 'active'")
            .fetch_all(pool)
            .await?;
    for row in guru {
        directory.add_guru(&row.nama, row.id);
    }

    let mapel = sqlx::query_as::<_, DbMapel>(
        "SELECT id, kode, nama, status FROM mapel WHERE status = 'active'",
    )
    .fetch_all(pool)
    .await?;
    for row in mapel {
        directory.add_mapel(&row.nama, row.id);
    }

    let ruang =
        sqlx::query_as::<_, DbRuang>("SELECT id, nama, status FROM ruang WHERE status = 'active'")
            .fetch_all(pool)
            .await?;
    for row in ruang {
        directory.add_ruang(&row.nama, row.id);
    }

    Ok(directory)
}
