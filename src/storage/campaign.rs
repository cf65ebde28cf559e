//! Campaign row access. Each store holds exactly one campaign row.

use jiff::Timestamp;
use rusqlite::{Connection, params};
use uuid::Uuid;

use super::{Result, StorageError};
use crate::model::Campaign;

pub fn insert(conn: &Connection, campaign: &Campaign) -> Result<()> {
    let config = serde_json::to_string(&campaign.config)?;
    conn.execute(
        "INSERT INTO campaign (id, name, config, current_cycle, cursor, completed, endless, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            campaign.id.to_string(),
            campaign.name,
            config,
            campaign.current_cycle,
            campaign.cursor,
            campaign.completed,
            campaign.endless,
            campaign.created_at.to_string(),
        ],
    )?;
    Ok(())
}

pub fn load(conn: &Connection) -> Result<Campaign> {
    let (id, name, config, current_cycle, cursor, completed, endless, created_at) = conn
        .query_row(
            "SELECT id, name, config, current_cycle, cursor, completed, endless, created_at
             FROM campaign LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, bool>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )?;

    Ok(Campaign {
        id: parse_uuid(&id)?,
        name,
        config: serde_json::from_str(&config)?,
        current_cycle,
        cursor,
        completed,
        endless,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub fn set_cursor(conn: &Connection, cursor: i64) -> Result<()> {
    conn.execute("UPDATE campaign SET cursor = ?1", params![cursor])?;
    Ok(())
}

pub fn set_completed(conn: &Connection, completed: bool) -> Result<()> {
    conn.execute("UPDATE campaign SET completed = ?1", params![completed])?;
    Ok(())
}

pub fn advance_cycle(conn: &Connection) -> Result<()> {
    conn.execute("UPDATE campaign SET current_cycle = current_cycle + 1", [])?;
    Ok(())
}

pub(crate) fn parse_uuid(text: &str) -> Result<Uuid> {
    text.parse()
        .map_err(|_| StorageError::Corrupt(format!("invalid UUID: {text}")))
}

pub(crate) fn parse_timestamp(text: &str) -> Result<Timestamp> {
    text.parse()
        .map_err(|_| StorageError::Corrupt(format!("invalid timestamp: {text}")))
}
