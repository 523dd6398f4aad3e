//! SQLite status journal.
//!
//! Every check cycle appends one row to `status_checks`, so the server can
//! tell when a vault crosses from one heartbeat action to the next (most
//! importantly ALIVE → EXPIRED) and operators can audit the history.

use deadswitch_vault::{HeartbeatAction, HeartbeatStatus, Timestamp};
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;

/// Open (or create) the journal at `path` and run migrations.
pub fn open_db(path: &Path) -> SqlResult<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    migrate(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> SqlResult<Connection> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS status_checks (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            label            TEXT NOT NULL,
            checked_at       INTEGER NOT NULL,
            last_heartbeat   INTEGER NOT NULL,
            deadline         INTEGER NOT NULL,
            secs_remaining   INTEGER NOT NULL,
            elapsed_fraction REAL NOT NULL,
            action           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_status_checks_label
            ON status_checks (label, id);
        ",
    )
}

/// One journal row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCheckRow {
    pub label: String,
    pub checked_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub deadline: Timestamp,
    pub secs_remaining: u64,
    pub elapsed_fraction: f64,
    pub action: HeartbeatAction,
}

impl StatusCheckRow {
    pub fn from_status(
        label: &str,
        checked_at: Timestamp,
        last_heartbeat: Timestamp,
        status: &HeartbeatStatus,
    ) -> Self {
        Self {
            label: label.to_string(),
            checked_at,
            last_heartbeat,
            deadline: status.deadline,
            secs_remaining: status.secs_remaining,
            elapsed_fraction: status.elapsed_fraction,
            action: status.action,
        }
    }
}

/// Append a status check.
pub fn record_check(conn: &Connection, row: &StatusCheckRow) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO status_checks
            (label, checked_at, last_heartbeat, deadline, secs_remaining, elapsed_fraction, action)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.label,
            to_sql_int(row.checked_at),
            to_sql_int(row.last_heartbeat),
            to_sql_int(row.deadline),
            to_sql_int(row.secs_remaining),
            row.elapsed_fraction,
            row.action.as_str(),
        ],
    )?;
    Ok(())
}

/// Most recent check for `label`, if any.
pub fn last_check(conn: &Connection, label: &str) -> SqlResult<Option<StatusCheckRow>> {
    Ok(recent_checks(conn, label, 1)?.into_iter().next())
}

/// Up to `limit` most recent checks for `label`, newest first.
pub fn recent_checks(
    conn: &Connection,
    label: &str,
    limit: usize,
) -> SqlResult<Vec<StatusCheckRow>> {
    let mut stmt = conn.prepare_cached(
        "SELECT label, checked_at, last_heartbeat, deadline, secs_remaining,
                elapsed_fraction, action
         FROM status_checks WHERE label = ?1 ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![label, limit as i64], |row| {
        let action: String = row.get(6)?;
        let action = HeartbeatAction::parse(&action).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("unknown action: {}", action).into(),
            )
        })?;
        Ok(StatusCheckRow {
            label: row.get(0)?,
            checked_at: row.get::<_, i64>(1)? as u64,
            last_heartbeat: row.get::<_, i64>(2)? as u64,
            deadline: row.get::<_, i64>(3)? as u64,
            secs_remaining: row.get::<_, i64>(4)? as u64,
            elapsed_fraction: row.get(5)?,
            action,
        })
    })?;
    let checks = rows.collect::<SqlResult<Vec<_>>>()?;
    Ok(checks)
}

/// SQLite integers are signed; clamp rather than wrap.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(checked_at: u64, action: HeartbeatAction) -> StatusCheckRow {
        StatusCheckRow {
            label: "vault".into(),
            checked_at,
            last_heartbeat: 0,
            deadline: 1000,
            secs_remaining: 1000u64.saturating_sub(checked_at),
            elapsed_fraction: checked_at as f64 / 1000.0,
            action,
        }
    }

    #[test]
    fn test_empty_journal() {
        let conn = open_in_memory().unwrap();
        assert!(last_check(&conn, "vault").unwrap().is_none());
    }

    #[test]
    fn test_record_and_read_back() {
        let conn = open_in_memory().unwrap();
        record_check(&conn, &row(100, HeartbeatAction::Healthy)).unwrap();
        record_check(&conn, &row(600, HeartbeatAction::CheckinRecommended)).unwrap();

        let last = last_check(&conn, "vault").unwrap().unwrap();
        assert_eq!(last, row(600, HeartbeatAction::CheckinRecommended));

        let recent = recent_checks(&conn, "vault", 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].action, HeartbeatAction::Healthy);
    }

    #[test]
    fn test_labels_are_separate() {
        let conn = open_in_memory().unwrap();
        record_check(&conn, &row(100, HeartbeatAction::Healthy)).unwrap();
        assert!(last_check(&conn, "other").unwrap().is_none());
    }

    #[test]
    fn test_reopen_keeps_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deadswitch.db");
        {
            let conn = open_db(&path).unwrap();
            record_check(&conn, &row(1200, HeartbeatAction::Expired)).unwrap();
        }
        let conn = open_db(&path).unwrap();
        let last = last_check(&conn, "vault").unwrap().unwrap();
        assert_eq!(last.action, HeartbeatAction::Expired);
        assert_eq!(last.checked_at, 1200);
    }
}
