//! Chronicle types: the append-only log of everything that happened.
//!
//! Attack entries double as the source of truth for undo; narrative
//! entries exist for the visible chronicle only.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dice::{HitQuality, RollAdjustment};
use crate::model::StatusEffect;

/// One chronicle record. `seq` is the campaign-global order: strictly
/// increasing, never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: i64,
    pub at: Timestamp,
    pub event: LogEvent,
}

/// What a chronicle record describes.
///
/// Tagged enum so each persisted payload is self-describing when read
/// back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogEvent {
    /// One combat action, with everything undo needs to reverse it.
    Attack {
        participant_id: Uuid,
        participant_name: String,
        enemy_id: Uuid,
        enemy_name: String,
        raw: u8,
        effective: u8,
        adjustment: Option<RollAdjustment>,
        quality: HitQuality,
        damage: i64,
        hit: bool,
        killing_blow: bool,
    },

    /// An enemy fell.
    EnemyVanquished {
        enemy_id: Uuid,
        enemy_name: String,
        by_id: Uuid,
        by_name: String,
    },

    /// A weapon drop was claimed under the Fair Sweat Rule.
    LootClaimed {
        enemy_id: Uuid,
        winner_id: Uuid,
        winner_name: String,
        tier: u8,
        upgraded: bool,
    },

    /// The fellowship crossed into a gate segment (boss or shadows ahead).
    GateReached { enemy_name: String },

    /// A participant's standing changed.
    StatusChanged {
        participant_id: Uuid,
        participant_name: String,
        from: StatusEffect,
        to: StatusEffect,
    },

    /// A participant gained a level.
    LevelUp {
        participant_id: Uuid,
        participant_name: String,
        level: u32,
    },

    /// Weekly resolution opened a new cycle.
    CycleStarted { cycle: u32 },

    /// The ledger ran a deficit: shadows were injected before the boss.
    ShadowsGrew { count: u32 },

    /// The ledger ran a surplus: shadows removed, boss possibly weakened.
    ShadowsReceded { removed: u32, boss_vitality_cut: i64 },

    /// A new hero joined the roster.
    HeroEnlisted { participant_id: Uuid, name: String },

    /// A hero left the roster.
    HeroRetired { participant_id: Uuid, name: String },

    /// The quest began.
    CampaignCreated { name: String },

    /// The final boss fell and the quest is over.
    CampaignCompleted,

    /// An enemy's flavor was rewritten.
    EnemyRenamed { enemy_id: Uuid, name: String },
}
