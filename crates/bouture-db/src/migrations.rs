use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            pseudo      TEXT NOT NULL,
            address     TEXT,
            postal_code INTEGER,
            city        TEXT,
            lat         REAL,
            lng         REAL,
            avatar      TEXT,
            roles       TEXT NOT NULL DEFAULT '[\"ROLE_USER\"]',
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS category (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS growth (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS plants (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            variety     TEXT,
            difficulty  INTEGER,
            description TEXT,
            image       TEXT,
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT,
            category_id TEXT NOT NULL REFERENCES category(id)
        );

        CREATE TABLE IF NOT EXISTS ads (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            city        TEXT,
            lat         REAL,
            lng         REAL,
            quantity    INTEGER NOT NULL,
            description TEXT,
            image       TEXT,
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT,
            category_id TEXT NOT NULL REFERENCES category(id),
            users_id    TEXT NOT NULL REFERENCES user(id),
            growths_id  TEXT NOT NULL REFERENCES growth(id),
            plants_id   TEXT REFERENCES plants(id)
        );

        CREATE INDEX IF NOT EXISTS idx_ads_status
            ON ads(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_ads_user
            ON ads(users_id);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            content     TEXT NOT NULL,
            status      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT,
            ads_id      TEXT NOT NULL REFERENCES ads(id),
            users_id    TEXT NOT NULL REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_ads
            ON messages(ads_id);

        -- Favorites join table; rows follow their endpoints.
        CREATE TABLE IF NOT EXISTS ads_user (
            ads_id      TEXT NOT NULL REFERENCES ads(id) ON DELETE CASCADE,
            users_id    TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            PRIMARY KEY (ads_id, users_id)
        );

        -- Seed the growth-stage taxonomy; it has no write API.
        INSERT OR IGNORE INTO growth (id, name) VALUES
            ('00000000-0000-0000-0000-000000000001', 'Graine'),
            ('00000000-0000-0000-0000-000000000002', 'Semis'),
            ('00000000-0000-0000-0000-000000000003', 'Bouture'),
            ('00000000-0000-0000-0000-000000000004', 'Plant raciné');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
