//! The quest engine.
//!
//! One [`Engine`] serves every campaign under its storage root. Each
//! operation opens its own connection and leans on the store for
//! serialization, so the engine itself holds no campaign state and can
//! be shared freely across threads.
//!
//! Operations are split across submodules by lifecycle: campaign forging
//! and roster changes, strike resolution, undo, and the weekly
//! reckoning.

mod action;
mod campaign;
mod undo;
mod week;

pub use campaign::CampaignSeed;

use jiff::Timestamp;
use rusqlite::Connection;
use uuid::Uuid;

use crate::broadcast::{Broadcast, NullBroadcast};
use crate::content::{ContentPool, StaticPool};
use crate::dice::{DiceSource, SeededDice};
use crate::error::{EngineError, Result};
use crate::model::{CampaignSnapshot, LogEvent};
use crate::storage::{self, Storage, StorageError};

pub struct Engine {
    storage: Storage,
    dice: Box<dyn DiceSource>,
    content: Box<dyn ContentPool>,
    broadcast: Box<dyn Broadcast>,
}

impl Engine {
    pub fn new(
        storage: Storage,
        dice: Box<dyn DiceSource>,
        content: Box<dyn ContentPool>,
        broadcast: Box<dyn Broadcast>,
    ) -> Self {
        Self {
            storage,
            dice,
            content,
            broadcast,
        }
    }

    /// An engine with entropy-seeded dice, the built-in bestiary, and no
    /// broadcast transport.
    pub fn with_defaults(storage: Storage) -> Self {
        Self::new(
            storage,
            Box::new(SeededDice::from_entropy()),
            Box::new(StaticPool::new()),
            Box::new(NullBroadcast),
        )
    }

    /// Opens a campaign's store, mapping a missing file to not-found.
    fn connect(&self, campaign_id: Uuid) -> Result<Connection> {
        self.storage.open_db(campaign_id).map_err(|e| match e {
            StorageError::CampaignNotFound(id) => EngineError::CampaignNotFound(id),
            other => EngineError::Storage(other),
        })
    }

    /// Loads the refreshed snapshot and pushes it to observers.
    fn snapshot_and_broadcast(
        &self,
        campaign_id: Uuid,
        conn: &Connection,
    ) -> Result<CampaignSnapshot> {
        let snapshot = storage::load_snapshot(conn)?;
        self.broadcast.publish(campaign_id, &snapshot);
        Ok(snapshot)
    }

    /// Appends a narrative entry outside the consistency-critical path.
    /// Failures are logged and swallowed; the chronicle is display color,
    /// not game state.
    fn narrate(&self, conn: &Connection, event: &LogEvent) {
        if let Err(e) = storage::log::append(conn, event, Timestamp::now()) {
            tracing::warn!("failed to append narrative entry: {e}");
        }
    }
}
