//! Chronicle access.
//!
//! Entries are append-only JSON rows keyed by a monotonic sequence.
//! Attack entries carry the facts undo needs to reverse a strike; every
//! other variant is narrative color, filed under the `system` kind so
//! `last_attack` can skip past it cheaply.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::campaign::parse_timestamp;
use super::Result;
use crate::model::{LogEntry, LogEvent};

pub fn append(conn: &Connection, event: &LogEvent, at: Timestamp) -> Result<i64> {
    let payload = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO chronicle (at, kind, event) VALUES (?1, ?2, ?3)",
        params![at.to_string(), kind_of(event), payload],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The newest entries, most recent first.
pub fn tail(conn: &Connection, limit: usize) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT seq, at, event FROM chronicle ORDER BY seq DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], read_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(from_raw(row?)?);
    }
    Ok(entries)
}

/// The most recent attack entry, if any attack is still on record.
pub fn last_attack(conn: &Connection) -> Result<Option<LogEntry>> {
    let raw = conn
        .query_row(
            "SELECT seq, at, event FROM chronicle
             WHERE kind = 'attack' ORDER BY seq DESC LIMIT 1",
            [],
            read_row,
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(from_raw(raw)?)),
        None => Ok(None),
    }
}

/// Entries recorded after the given sequence, oldest first.
pub fn entries_after(conn: &Connection, seq: i64) -> Result<Vec<LogEntry>> {
    let mut stmt =
        conn.prepare("SELECT seq, at, event FROM chronicle WHERE seq > ?1 ORDER BY seq")?;
    let rows = stmt.query_map(params![seq], read_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(from_raw(row?)?);
    }
    Ok(entries)
}

pub fn delete(conn: &Connection, seq: i64) -> Result<()> {
    conn.execute("DELETE FROM chronicle WHERE seq = ?1", params![seq])?;
    Ok(())
}

fn kind_of(event: &LogEvent) -> &'static str {
    match event {
        LogEvent::Attack { .. } => "attack",
        _ => "system",
    }
}

fn read_row(row: &Row) -> rusqlite::Result<(i64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn from_raw((seq, at, event): (i64, String, String)) -> Result<LogEntry> {
    Ok(LogEntry {
        seq,
        at: parse_timestamp(&at)?,
        event: serde_json::from_str(&event)?,
    })
}
