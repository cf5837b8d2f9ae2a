//! libSQL backend — async `MemberStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::onboarding::RegistrationStep;
use crate::store::migrations;
use crate::store::traits::{MemberRecord, MemberStore, MemberUpdate};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Read a nullable TEXT column.
fn opt_text(row: &libsql::Row, idx: i32) -> Result<Option<String>, libsql::Error> {
    match row.get_value(idx)? {
        libsql::Value::Text(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Map a libsql Row to a MemberRecord.
///
/// Column order matches MEMBER_COLUMNS.
fn row_to_member(row: &libsql::Row) -> Result<MemberRecord, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("member row parse: {e}"));

    let id: String = row.get(0).map_err(read)?;
    let step_raw: i64 = row.get(1).map_err(read)?;
    let registration_step = RegistrationStep::from_i64(step_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("member {id} has registration_step {step_raw}"))
    })?;
    let discord_name: String = row.get(2).map_err(read)?;
    let characters = match opt_text(row, 3).map_err(read)? {
        Some(json) => serde_json::from_str::<BTreeMap<String, String>>(&json)
            .map_err(|e| DatabaseError::Serialization(format!("characters for {id}: {e}")))?,
        None => BTreeMap::new(),
    };
    let acct_name = opt_text(row, 4).map_err(read)?;
    let server = opt_text(row, 5).map_err(read)?;
    let main_character = opt_text(row, 6).map_err(read)?;
    let created_str: String = row.get(7).map_err(read)?;
    let updated_str: String = row.get(8).map_err(read)?;

    Ok(MemberRecord {
        id,
        registration_step,
        discord_name,
        characters,
        acct_name,
        server,
        main_character,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Columns and values written by a partial update, in placeholder order.
fn update_columns(
    update: &MemberUpdate,
) -> Result<(Vec<&'static str>, Vec<libsql::Value>), DatabaseError> {
    let mut columns = Vec::new();
    let mut values = Vec::new();

    if let Some(characters) = &update.characters {
        let json = serde_json::to_string(characters)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        columns.push("characters");
        values.push(libsql::Value::Text(json));
    }
    if let Some(acct_name) = &update.acct_name {
        columns.push("acct_name");
        values.push(libsql::Value::Text(acct_name.clone()));
    }
    if let Some(server) = &update.server {
        columns.push("server");
        values.push(libsql::Value::Text(server.clone()));
    }
    if let Some(main_character) = &update.main_character {
        columns.push("main_character");
        values.push(libsql::Value::Text(main_character.clone()));
    }

    Ok((columns, values))
}

/// Build the `SET` assignments and values for a partial update.
///
/// Placeholders are numbered from `?1`; the caller appends its own
/// parameters after the returned values.
fn update_assignments(
    update: &MemberUpdate,
) -> Result<(Vec<String>, Vec<libsql::Value>), DatabaseError> {
    let (columns, values) = update_columns(update)?;
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ?{}", i + 1))
        .collect();
    Ok((assignments, values))
}

// ── Trait implementation ────────────────────────────────────────────

const MEMBER_COLUMNS: &str = "id, registration_step, discord_name, characters, acct_name, server, main_character, created_at, updated_at";

#[async_trait]
impl MemberStore for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn get_member(&self, id: &str) -> Result<Option<MemberRecord>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_member: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_member(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_member: {e}"))),
        }
    }

    async fn create_member(
        &self,
        id: &str,
        discord_name: &str,
    ) -> Result<MemberRecord, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let inserted = conn
            .execute(
                "INSERT INTO members (id, registration_step, discord_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (id) DO UPDATE SET discord_name = excluded.discord_name
                 WHERE members.discord_name = ''",
                params![id, RegistrationStep::Welcome.as_i64(), discord_name, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_member: {e}")))?;

        if inserted > 0 {
            debug!(member_id = %id, "Member created");
        }

        self.get_member(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "member".into(),
                id: id.to_string(),
            })
    }

    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<(), DatabaseError> {
        let (mut columns, mut values) = update_columns(update)?;
        let written: Vec<&str> = columns.clone();

        columns.extend(["id", "registration_step", "discord_name", "created_at", "updated_at"]);
        let now = Utc::now().to_rfc3339();
        values.push(libsql::Value::Text(id.to_string()));
        values.push(libsql::Value::Integer(RegistrationStep::Welcome.as_i64()));
        values.push(libsql::Value::Text(String::new()));
        values.push(libsql::Value::Text(now.clone()));
        values.push(libsql::Value::Text(now));

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let assignments: Vec<String> = written
            .iter()
            .chain(std::iter::once(&"updated_at"))
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();

        let sql = format!(
            "INSERT INTO members ({}) VALUES ({})
             ON CONFLICT (id) DO UPDATE SET {}",
            columns.join(", "),
            placeholders.join(", "),
            assignments.join(", ")
        );
        self.conn()
            .execute(&sql, values)
            .await
            .map_err(|e| DatabaseError::Query(format!("update_member: {e}")))?;

        debug!(member_id = %id, fields = ?written, "Member upserted");
        Ok(())
    }

    async fn advance_step(
        &self,
        id: &str,
        expected: RegistrationStep,
        update: &MemberUpdate,
    ) -> Result<bool, DatabaseError> {
        let Some(next) = expected.next() else {
            return Ok(false);
        };

        let (mut assignments, mut values) = update_assignments(update)?;
        assignments.push(format!("registration_step = ?{}", values.len() + 1));
        values.push(libsql::Value::Integer(next.as_i64()));
        assignments.push(format!("updated_at = ?{}", values.len() + 1));
        values.push(libsql::Value::Text(Utc::now().to_rfc3339()));
        let id_slot = values.len() + 1;
        values.push(libsql::Value::Text(id.to_string()));
        let step_slot = values.len() + 1;
        values.push(libsql::Value::Integer(expected.as_i64()));

        let sql = format!(
            "UPDATE members SET {} WHERE id = ?{id_slot} AND registration_step = ?{step_slot}",
            assignments.join(", ")
        );
        let changed = self
            .conn()
            .execute(&sql, values)
            .await
            .map_err(|e| DatabaseError::Query(format!("advance_step: {e}")))?;

        if changed > 0 {
            debug!(member_id = %id, from = %expected, to = %next, "Registration step advanced");
        } else {
            debug!(member_id = %id, expected = %expected, "Registration step not advanced (stale)");
        }
        Ok(changed > 0)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
