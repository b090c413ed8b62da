// Credvault — SQLite Database Management
//
// Opens the vault database and creates the schema. Sensitive columns are
// encrypted field-by-field by the service before they reach this layer, so
// the file itself is plain SQLite.

use std::path::Path;

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around the vault's SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database. Nothing survives the connection.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS reg_user (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                created_on  TEXT NOT NULL,
                updated_on  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS credential_record (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                notes       TEXT,
                created_on  TEXT NOT NULL,
                updated_on  TEXT NOT NULL,
                created_by  TEXT NOT NULL,
                updated_by  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS login (
                id          TEXT PRIMARY KEY
                            REFERENCES credential_record(id) ON DELETE CASCADE,
                username    TEXT,
                password    TEXT,
                url         TEXT
            );

            CREATE TABLE IF NOT EXISTS card (
                id                  TEXT PRIMARY KEY
                                    REFERENCES credential_record(id) ON DELETE CASCADE,
                brand               TEXT,
                number              TEXT,
                expiration_month    TEXT,
                expiration_year     TEXT,
                cvv                 TEXT
            );

            CREATE TABLE IF NOT EXISTS identity (
                id              TEXT PRIMARY KEY
                                REFERENCES credential_record(id) ON DELETE CASCADE,
                first_name      TEXT,
                middle_name     TEXT,
                last_name       TEXT,
                address         TEXT,
                email           TEXT,
                phone_number    TEXT,
                passport_number TEXT,
                country         TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_credential_record_owner
                ON credential_record(created_by);

            -- A core id may own at most one extension row across variant tables.
            CREATE TRIGGER IF NOT EXISTS login_single_variant
            BEFORE INSERT ON login
            WHEN EXISTS (SELECT 1 FROM card WHERE id = NEW.id)
              OR EXISTS (SELECT 1 FROM identity WHERE id = NEW.id)
            BEGIN
                SELECT RAISE(ABORT, 'record already has a variant');
            END;

            CREATE TRIGGER IF NOT EXISTS card_single_variant
            BEFORE INSERT ON card
            WHEN EXISTS (SELECT 1 FROM login WHERE id = NEW.id)
              OR EXISTS (SELECT 1 FROM identity WHERE id = NEW.id)
            BEGIN
                SELECT RAISE(ABORT, 'record already has a variant');
            END;

            CREATE TRIGGER IF NOT EXISTS identity_single_variant
            BEFORE INSERT ON identity
            WHEN EXISTS (SELECT 1 FROM login WHERE id = NEW.id)
              OR EXISTS (SELECT 1 FROM card WHERE id = NEW.id)
            BEGIN
                SELECT RAISE(ABORT, 'record already has a variant');
            END;
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
