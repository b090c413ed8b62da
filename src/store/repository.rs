// Credvault — Record Store Repository
//
// Persists the two-table representation of records: one `credential_record`
// row per record, plus one extension row (same id) for non-note variants.
// Every multi-table write runs in a single transaction, and an update or
// delete that touches zero rows is reported as `NotFound`.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use super::db::Database;
use super::models::{
    CardFields, CardRecord, CredentialRecord, IdentityFields, IdentityRecord, LoginFields,
    LoginRecord, RecordKind, RecordListing, VariantFields, VariantRecord,
};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over record storage operations.
///
/// Values passed in and returned are stored values: sensitive fields are
/// whatever the caller handed over (ciphertext, in practice).
pub trait RecordStore {
    /// All records created by `owner`, bucketed by kind and ordered by
    /// (creation time, name, id). A core with an extension row is never
    /// listed as a secure note.
    fn list_all(&self, owner: &Uuid) -> Result<RecordListing, StoreError>;

    /// The core row only.
    fn get_core(&self, id: &Uuid) -> Result<CredentialRecord, StoreError>;

    /// Core joined with its login row; `NotFound` if either half is missing.
    fn get_login(&self, id: &Uuid) -> Result<LoginRecord, StoreError>;

    fn get_card(&self, id: &Uuid) -> Result<CardRecord, StoreError>;

    fn get_identity(&self, id: &Uuid) -> Result<IdentityRecord, StoreError>;

    /// Insert a bare core row (a secure note).
    fn create_core(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError>;

    /// Insert core and login rows atomically.
    fn create_login(&self, record: &LoginRecord) -> Result<LoginRecord, StoreError>;

    fn create_card(&self, record: &CardRecord) -> Result<CardRecord, StoreError>;

    fn create_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError>;

    /// Update the core row. Absent optional fields keep their stored value.
    fn update_core(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError>;

    /// Update core and login rows atomically.
    fn update_login(&self, record: &LoginRecord) -> Result<LoginRecord, StoreError>;

    fn update_card(&self, record: &CardRecord) -> Result<CardRecord, StoreError>;

    fn update_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError>;

    /// Delete the record (core and any extension row). Returns the deleted
    /// core as it was stored.
    fn delete(&self, id: &Uuid) -> Result<CredentialRecord, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

const CORE_COLUMNS: &str =
    "c.id, c.name, c.notes, c.created_on, c.updated_on, c.created_by, c.updated_by";

/// Number of core columns at the front of every record row.
const CORE_WIDTH: usize = 7;

pub struct SqliteRecordStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteRecordStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn get_variant<F: VariantFields>(&self, id: &Uuid) -> Result<VariantRecord<F>, StoreError> {
        select_variant::<F>(self.db.conn(), id)
    }

    fn create_variant<F: VariantFields>(
        &self,
        record: &VariantRecord<F>,
    ) -> Result<VariantRecord<F>, StoreError> {
        let tx = self.db.conn().unchecked_transaction()?;

        insert_core(&tx, &record.core)?;
        insert_variant(&tx, &record.core.id, &record.fields)?;

        tx.commit()?;

        tracing::info!(
            record_id = %record.core.id,
            kind = %F::KIND,
            "Record stored successfully"
        );

        Ok(record.clone())
    }

    fn update_variant<F: VariantFields>(
        &self,
        record: &VariantRecord<F>,
    ) -> Result<VariantRecord<F>, StoreError> {
        let id = &record.core.id;
        let tx = self.db.conn().unchecked_transaction()?;

        if update_core_row(&tx, &record.core)? == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        // Dropping `tx` without commit rolls the core update back.
        if update_variant_row(&tx, id, &record.fields)? == 0 {
            return Err(StoreError::NotFound(format!("{} {}", F::KIND, id)));
        }

        let updated = select_variant::<F>(&tx, id)?;
        tx.commit()?;

        tracing::debug!(record_id = %id, kind = %F::KIND, "Record updated");

        Ok(updated)
    }

    fn list_variant<F: VariantFields>(
        &self,
        owner: &Uuid,
    ) -> Result<Vec<VariantRecord<F>>, StoreError> {
        let sql = format!(
            "SELECT {core}, {fields}
             FROM {table} v
             INNER JOIN credential_record c ON c.id = v.id
             WHERE c.created_by = ?1
             ORDER BY c.created_on, c.name, c.id",
            core = CORE_COLUMNS,
            fields = variant_columns::<F>(),
            table = F::TABLE,
        );

        let mut stmt = self.db.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![owner.to_string()], row_to_variant::<F>)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    fn list_secure_notes(&self, owner: &Uuid) -> Result<Vec<CredentialRecord>, StoreError> {
        let without_extension: Vec<String> = RecordKind::ALL
            .iter()
            .filter_map(|kind| kind.table())
            .map(|table| format!("NOT EXISTS (SELECT 1 FROM {} v WHERE v.id = c.id)", table))
            .collect();

        let sql = format!(
            "SELECT {core}
             FROM credential_record c
             WHERE c.created_by = ?1 AND {without_extension}
             ORDER BY c.created_on, c.name, c.id",
            core = CORE_COLUMNS,
            without_extension = without_extension.join(" AND "),
        );

        let mut stmt = self.db.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![owner.to_string()], row_to_core)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }
}

impl<'a> RecordStore for SqliteRecordStore<'a> {
    fn list_all(&self, owner: &Uuid) -> Result<RecordListing, StoreError> {
        Ok(RecordListing {
            secure_notes: self.list_secure_notes(owner)?,
            logins: self.list_variant::<LoginFields>(owner)?,
            cards: self.list_variant::<CardFields>(owner)?,
            identities: self.list_variant::<IdentityFields>(owner)?,
        })
    }

    fn get_core(&self, id: &Uuid) -> Result<CredentialRecord, StoreError> {
        select_core(self.db.conn(), id)
    }

    fn get_login(&self, id: &Uuid) -> Result<LoginRecord, StoreError> {
        self.get_variant(id)
    }

    fn get_card(&self, id: &Uuid) -> Result<CardRecord, StoreError> {
        self.get_variant(id)
    }

    fn get_identity(&self, id: &Uuid) -> Result<IdentityRecord, StoreError> {
        self.get_variant(id)
    }

    fn create_core(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        insert_core(self.db.conn(), record)?;

        tracing::info!(
            record_id = %record.id,
            kind = %RecordKind::SecureNote,
            "Record stored successfully"
        );

        Ok(record.clone())
    }

    fn create_login(&self, record: &LoginRecord) -> Result<LoginRecord, StoreError> {
        self.create_variant(record)
    }

    fn create_card(&self, record: &CardRecord) -> Result<CardRecord, StoreError> {
        self.create_variant(record)
    }

    fn create_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError> {
        self.create_variant(record)
    }

    fn update_core(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let tx = self.db.conn().unchecked_transaction()?;

        if update_core_row(&tx, record)? == 0 {
            return Err(StoreError::NotFound(format!("record {}", record.id)));
        }

        let updated = select_core(&tx, &record.id)?;
        tx.commit()?;

        tracing::debug!(record_id = %record.id, kind = %RecordKind::SecureNote, "Record updated");

        Ok(updated)
    }

    fn update_login(&self, record: &LoginRecord) -> Result<LoginRecord, StoreError> {
        self.update_variant(record)
    }

    fn update_card(&self, record: &CardRecord) -> Result<CardRecord, StoreError> {
        self.update_variant(record)
    }

    fn update_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError> {
        self.update_variant(record)
    }

    fn delete(&self, id: &Uuid) -> Result<CredentialRecord, StoreError> {
        let tx = self.db.conn().unchecked_transaction()?;

        let snapshot = select_core(&tx, id)?;

        for table in RecordKind::ALL.iter().filter_map(|kind| kind.table()) {
            tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", table),
                params![id.to_string()],
            )?;
        }

        let affected = tx.execute(
            "DELETE FROM credential_record WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }

        tx.commit()?;

        tracing::info!(record_id = %id, "Record deleted");

        Ok(snapshot)
    }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_core(conn: &Connection, id: &Uuid) -> Result<CredentialRecord, StoreError> {
    let sql = format!("SELECT {} FROM credential_record c WHERE c.id = ?1", CORE_COLUMNS);

    conn.query_row(&sql, params![id.to_string()], row_to_core)
        .map_err(|e| not_found(e, format!("record {}", id)))
}

fn select_variant<F: VariantFields>(
    conn: &Connection,
    id: &Uuid,
) -> Result<VariantRecord<F>, StoreError> {
    let sql = format!(
        "SELECT {core}, {fields}
         FROM credential_record c
         INNER JOIN {table} v ON v.id = c.id
         WHERE c.id = ?1",
        core = CORE_COLUMNS,
        fields = variant_columns::<F>(),
        table = F::TABLE,
    );

    conn.query_row(&sql, params![id.to_string()], row_to_variant::<F>)
        .map_err(|e| not_found(e, format!("{} {}", F::KIND, id)))
}

fn insert_core(conn: &Connection, record: &CredentialRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO credential_record
            (id, name, notes, created_on, updated_on, created_by, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.name,
            record.notes,
            format_time(&record.created_on),
            format_time(&record.updated_on),
            record.created_by.to_string(),
            record.updated_by.to_string(),
        ],
    )?;
    Ok(())
}

fn insert_variant<F: VariantFields>(
    conn: &Connection,
    id: &Uuid,
    fields: &F,
) -> Result<(), StoreError> {
    let placeholders: Vec<String> = (1..=F::COLUMNS.len() + 1).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {table} (id, {columns}) VALUES ({placeholders})",
        table = F::TABLE,
        columns = F::COLUMNS.join(", "),
        placeholders = placeholders.join(", "),
    );

    let mut values: Vec<Option<String>> = vec![Some(id.to_string())];
    values.extend(fields.fields().into_iter().cloned());

    conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(())
}

/// Returns the number of rows touched. Absent or empty values keep the
/// stored column.
fn update_core_row(conn: &Connection, record: &CredentialRecord) -> Result<usize, StoreError> {
    let affected = conn.execute(
        "UPDATE credential_record
         SET name = COALESCE(NULLIF(?2, ''), name),
             notes = COALESCE(NULLIF(?3, ''), notes),
             updated_on = ?4,
             updated_by = ?5
         WHERE id = ?1",
        params![
            record.id.to_string(),
            record.name,
            record.notes,
            format_time(&record.updated_on),
            record.updated_by.to_string(),
        ],
    )?;
    Ok(affected)
}

fn update_variant_row<F: VariantFields>(
    conn: &Connection,
    id: &Uuid,
    fields: &F,
) -> Result<usize, StoreError> {
    let assignments: Vec<String> = F::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = COALESCE(NULLIF(?{}, ''), {column})", i + 2))
        .collect();
    let sql = format!(
        "UPDATE {table} SET {assignments} WHERE id = ?1",
        table = F::TABLE,
        assignments = assignments.join(", "),
    );

    let mut values: Vec<Option<String>> = vec![Some(id.to_string())];
    values.extend(fields.fields().into_iter().cloned());

    let affected = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(affected)
}

fn variant_columns<F: VariantFields>() -> String {
    F::COLUMNS
        .iter()
        .map(|column| format!("v.{}", column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a core record from the first `CORE_WIDTH` columns of a row.
fn row_to_core(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let notes: Option<String> = row.get(2)?;
    let created_on_str: String = row.get(3)?;
    let updated_on_str: String = row.get(4)?;
    let created_by_str: String = row.get(5)?;
    let updated_by_str: String = row.get(6)?;

    Ok(CredentialRecord {
        id: parse_uuid(0, &id_str)?,
        name,
        notes,
        created_on: parse_time(3, &created_on_str)?,
        updated_on: parse_time(4, &updated_on_str)?,
        created_by: parse_uuid(5, &created_by_str)?,
        updated_by: parse_uuid(6, &updated_by_str)?,
    })
}

fn row_to_variant<F: VariantFields>(row: &rusqlite::Row<'_>) -> rusqlite::Result<VariantRecord<F>> {
    let core = row_to_core(row)?;

    let mut fields = F::default();
    for (i, field) in fields.fields_mut().into_iter().enumerate() {
        *field = row.get(CORE_WIDTH + i)?;
    }

    Ok(VariantRecord::new(core, fields))
}

pub(crate) fn parse_uuid(idx: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Fixed-width UTC timestamps, so text order matches time order.
pub(crate) fn format_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn not_found(err: rusqlite::Error, what: String) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(what),
        other => StoreError::Database(other),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
