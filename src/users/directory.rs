// Credvault — User Directory
//
// Lookup by id or by unique name over the `reg_user` table.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{format_time, now_millis, parse_time, parse_uuid, Database, StoreError};

/// A registered vault user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Read access to registered users.
pub trait UserDirectory {
    fn get_user_by_id(&self, id: &Uuid) -> Result<User, StoreError>;

    fn get_user_by_name(&self, name: &str) -> Result<User, StoreError>;
}

pub struct SqliteUserDirectory<'a> {
    db: &'a Database,
}

impl<'a> SqliteUserDirectory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new user. Names are unique; a duplicate is rejected by the
    /// database constraint.
    pub fn create_user(&self, name: &str) -> Result<User, StoreError> {
        if name.is_empty() {
            return Err(StoreError::Other("user name is empty".to_string()));
        }

        let now = now_millis();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_on: now,
            updated_on: now,
        };

        self.db.conn().execute(
            "INSERT INTO reg_user (id, name, created_on, updated_on)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.name,
                format_time(&user.created_on),
                format_time(&user.updated_on),
            ],
        )?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    fn select_one(&self, column: &str, value: &str) -> Result<User, StoreError> {
        let sql = format!(
            "SELECT id, name, created_on, updated_on FROM reg_user WHERE {} = ?1",
            column
        );

        self.db
            .conn()
            .query_row(&sql, params![value], row_to_user)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("user {}", value))
                }
                other => StoreError::Database(other),
            })
    }
}

impl<'a> UserDirectory for SqliteUserDirectory<'a> {
    fn get_user_by_id(&self, id: &Uuid) -> Result<User, StoreError> {
        self.select_one("id", &id.to_string())
    }

    fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        self.select_one("name", name)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let created_on_str: String = row.get(2)?;
    let updated_on_str: String = row.get(3)?;

    Ok(User {
        id: parse_uuid(0, &id_str)?,
        name,
        created_on: parse_time(2, &created_on_str)?,
        updated_on: parse_time(3, &updated_on_str)?,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
