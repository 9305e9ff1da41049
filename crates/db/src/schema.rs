use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Reference entities: the scheduler reads id, display name, status.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kelas (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nama VARCHAR(255) NOT NULL,
            tingkat VARCHAR(32) NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guru (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nama VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mapel (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            kode VARCHAR(32) NOT NULL,
            nama VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ruang (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nama VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Period catalog: per-class period ordinal to clock times.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jam_pelajaran (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            kelas_id UUID NOT NULL REFERENCES kelas(id),
            jam_ke SMALLINT NOT NULL,
            jam_mulai TIME NOT NULL,
            jam_selesai TIME NOT NULL,
            label VARCHAR(255) NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            CONSTRAINT jam_pelajaran_valid_range CHECK (jam_selesai > jam_mulai),
            CONSTRAINT jam_pelajaran_unique_period UNIQUE (kelas_id, jam_ke)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // The timetable itself. Times are denormalized from the catalog at
    // creation so slots can be edited independently of it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jadwal (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            kelas_id UUID NOT NULL REFERENCES kelas(id),
            hari VARCHAR(16) NOT NULL,
            jam_ke SMALLINT NOT NULL,
            jam_mulai TIME NOT NULL,
            jam_selesai TIME NOT NULL,
            jenis_aktivitas VARCHAR(16) NOT NULL,
            mapel_id UUID NULL REFERENCES mapel(id),
            ruang_id UUID NULL REFERENCES ruang(id),
            catatan TEXT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT jadwal_valid_range CHECK (jam_selesai > jam_mulai)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Last-resort guard against concurrent writers that both passed
    // the conflict check: a 23505 here surfaces as a conflict.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_jadwal_active_slot
        ON jadwal(kelas_id, hari, jam_ke)
        WHERE status = 'active';
        "#,
    )
    .execute(pool)
    .await?;

    // Co-teacher assignments; exactly one primary per lesson slot.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jadwal_guru (
            jadwal_id UUID NOT NULL REFERENCES jadwal(id),
            guru_id UUID NOT NULL REFERENCES guru(id),
            is_primary BOOLEAN NOT NULL DEFAULT FALSE,
            PRIMARY KEY (jadwal_id, guru_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_jadwal_kelas_hari ON jadwal(kelas_id, hari);
        CREATE INDEX IF NOT EXISTS idx_jadwal_hari ON jadwal(hari);
        CREATE INDEX IF NOT EXISTS idx_jadwal_ruang ON jadwal(ruang_id);
        CREATE INDEX IF NOT EXISTS idx_jadwal_guru_guru ON jadwal_guru(guru_id);
        CREATE INDEX IF NOT EXISTS idx_jam_pelajaran_kelas ON jam_pelajaran(kelas_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
