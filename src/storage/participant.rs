//! Participant row access.
//!
//! Strike bookkeeping is pure SQL arithmetic so that two connections
//! crediting the same hero never lose an update.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::campaign::{parse_timestamp, parse_uuid};
use super::{Result, StorageError};
use crate::model::{Participant, StatusEffect};

const COLUMNS: &str = "id, name, level, weapon_tier, total_oaths, cycle_oaths, status,
                       bounty_score, max_roll_count, highest_roll, bounty_updated_at, enlisted_at";

type RawRow = (
    String,
    String,
    u32,
    u8,
    u32,
    u32,
    String,
    u32,
    u32,
    u8,
    String,
    String,
);

pub fn insert(conn: &Connection, participant: &Participant) -> Result<()> {
    conn.execute(
        "INSERT INTO participant (id, name, level, weapon_tier, total_oaths, cycle_oaths, status,
                                  bounty_score, max_roll_count, highest_roll, bounty_updated_at, enlisted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            participant.id.to_string(),
            participant.name,
            participant.level,
            participant.weapon_tier,
            participant.total_oaths,
            participant.cycle_oaths,
            serialize_status(participant.status),
            participant.bounty_score,
            participant.max_roll_count,
            participant.highest_roll,
            participant.bounty_updated_at.to_string(),
            participant.enlisted_at.to_string(),
        ],
    )?;
    Ok(())
}

/// Loads the full roster in enlistment order.
pub fn load_all(conn: &Connection) -> Result<Vec<Participant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM participant ORDER BY enlisted_at, id"
    ))?;
    let rows = stmt.query_map([], read_row)?;

    let mut participants = Vec::new();
    for row in rows {
        participants.push(from_raw(row?)?);
    }
    Ok(participants)
}

pub fn find(conn: &Connection, id: Uuid) -> Result<Option<Participant>> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM participant WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(from_raw(raw)?)),
        None => Ok(None),
    }
}

/// Credits one completed oath and folds the raw die into the bounty
/// tallies, all in a single atomic update.
pub fn credit_strike(
    conn: &Connection,
    id: Uuid,
    raw: u8,
    rolled_max: bool,
    at: &Timestamp,
) -> Result<()> {
    conn.execute(
        "UPDATE participant
         SET total_oaths = total_oaths + 1,
             cycle_oaths = cycle_oaths + 1,
             bounty_score = bounty_score + ?2,
             max_roll_count = max_roll_count + ?3,
             highest_roll = MAX(highest_roll, ?2),
             bounty_updated_at = ?4
         WHERE id = ?1",
        params![id.to_string(), raw, u32::from(rolled_max), at.to_string()],
    )?;
    Ok(())
}

/// Reverses the counter half of [`credit_strike`]. All decrements clamp
/// at zero; `highest_roll` is deliberately left alone since the die that
/// set it may not be the one being reverted.
pub fn revert_strike(conn: &Connection, id: Uuid, raw: u8, rolled_max: bool) -> Result<()> {
    conn.execute(
        "UPDATE participant
         SET total_oaths = MAX(total_oaths - 1, 0),
             cycle_oaths = MAX(cycle_oaths - 1, 0),
             bounty_score = MAX(bounty_score - ?2, 0),
             max_roll_count = MAX(max_roll_count - ?3, 0)
         WHERE id = ?1",
        params![id.to_string(), raw, u32::from(rolled_max)],
    )?;
    Ok(())
}

pub fn set_weapon_tier(conn: &Connection, id: Uuid, tier: u8) -> Result<()> {
    conn.execute(
        "UPDATE participant SET weapon_tier = ?2 WHERE id = ?1",
        params![id.to_string(), tier],
    )?;
    Ok(())
}

pub fn set_status(conn: &Connection, id: Uuid, status: StatusEffect) -> Result<()> {
    conn.execute(
        "UPDATE participant SET status = ?2 WHERE id = ?1",
        params![id.to_string(), serialize_status(status)],
    )?;
    Ok(())
}

/// Applies a weekly verdict: new strength, new status, counter reset.
pub fn resolve_cycle(conn: &Connection, id: Uuid, level: u32, status: StatusEffect) -> Result<()> {
    conn.execute(
        "UPDATE participant SET level = ?2, status = ?3, cycle_oaths = 0 WHERE id = ?1",
        params![id.to_string(), level, serialize_status(status)],
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, id: Uuid) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM participant WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(rows > 0)
}

fn read_row(row: &Row) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn from_raw(raw: RawRow) -> Result<Participant> {
    let (
        id,
        name,
        level,
        weapon_tier,
        total_oaths,
        cycle_oaths,
        status,
        bounty_score,
        max_roll_count,
        highest_roll,
        bounty_updated_at,
        enlisted_at,
    ) = raw;

    Ok(Participant {
        id: parse_uuid(&id)?,
        name,
        level,
        weapon_tier,
        total_oaths,
        cycle_oaths,
        status: deserialize_status(&status)?,
        bounty_score,
        max_roll_count,
        highest_roll,
        bounty_updated_at: parse_timestamp(&bounty_updated_at)?,
        enlisted_at: parse_timestamp(&enlisted_at)?,
    })
}

fn serialize_status(status: StatusEffect) -> &'static str {
    match status {
        StatusEffect::Sustained => "sustained",
        StatusEffect::Inspired => "inspired",
        StatusEffect::Cursed => "cursed",
        StatusEffect::Blessed => "blessed",
    }
}

fn deserialize_status(text: &str) -> Result<StatusEffect> {
    match text {
        "sustained" => Ok(StatusEffect::Sustained),
        "inspired" => Ok(StatusEffect::Inspired),
        "cursed" => Ok(StatusEffect::Cursed),
        "blessed" => Ok(StatusEffect::Blessed),
        other => Err(StorageError::Corrupt(format!("unknown status: {other}"))),
    }
}
