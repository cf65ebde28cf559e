//! Campaign types: one cooperative quest instance.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cooperative quest: a roster working through a scripted enemy queue
/// over a fixed number of weekly cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub config: QuestConfig,

    /// Current weekly cycle, starting at 1.
    pub current_cycle: u32,

    /// Ordering-key lower bound for the live-target search.
    ///
    /// Not a dense index: ordering keys go sparse after shadow injection
    /// and removal. The live target is always the lowest ordering key at
    /// or past this cursor among non-defeated enemies.
    pub cursor: i64,

    /// Set when the final boss falls, unless the campaign is endless.
    pub completed: bool,

    /// Endless campaigns never complete; the quest stays open for
    /// whatever the weekly ledger injects next.
    pub endless: bool,

    pub created_at: Timestamp,
}

/// Flat campaign configuration, persisted verbatim with the campaign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuestConfig {
    /// Number of weekly cycles in the quest.
    pub cycles: u32,

    /// Per-participant activity goal per cycle.
    pub oaths_per_cycle: u32,

    /// Intended roster size.
    pub roster_size: u32,
}
