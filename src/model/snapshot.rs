//! Client-facing views: the broadcast snapshot and operation results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dice::{HitQuality, RollAdjustment};
use crate::model::{Campaign, Enemy, LogEntry, Participant, StatusEffect};

/// The full refreshed view of a campaign, pushed to every observer after
/// each mutation and returned by most operations.
///
/// Participants come in roster order, enemies by ordering key, and the
/// chronicle newest-first capped at the storage tail length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub campaign: Campaign,
    pub participants: Vec<Participant>,
    pub enemies: Vec<Enemy>,
    pub log: Vec<LogEntry>,
}

/// What one combat action did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// The raw d20.
    pub roll: u8,

    /// The roll after status modification, if any applied.
    pub effective: u8,

    pub adjustment: Option<RollAdjustment>,
    pub quality: HitQuality,
    pub damage: i64,

    /// This action observed the kill transition.
    pub killed: bool,

    /// The strike was nullified outright.
    pub missed: bool,

    /// Set when the kill dropped loot.
    pub loot: Option<LootAward>,

    pub snapshot: CampaignSnapshot,
}

/// The outcome of loot arbitration for a single kill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootAward {
    pub winner_id: Uuid,
    pub winner_name: String,
    pub winner_level: u32,
    pub tier: u8,

    /// False means a prestige-only award: everyone already carried this
    /// tier or better, so no armament changed.
    pub upgraded: bool,
}

/// Structured result of one weekly resolution, returned alongside the
/// refreshed snapshot so clients never reconstruct it from log text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// The cycle that was just resolved.
    pub cycle: u32,

    pub outcomes: Vec<ParticipantOutcome>,

    /// Sum of every participant's goal for the cycle.
    pub required: u32,

    /// Sum of every participant's actual activity for the cycle.
    pub delivered: u32,

    pub shadows_created: u32,
    pub shadows_removed: u32,

    /// Surplus beyond removable shadows, applied to the boss's vitality.
    pub boss_vitality_cut: i64,
}

/// How one participant's cycle went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub participant_id: Uuid,
    pub name: String,
    pub outcome: CycleOutcome,
    pub status_before: StatusEffect,
    pub status_after: StatusEffect,
    pub leveled_up: bool,
}

/// Cycle activity measured against the configured goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// Activity above goal.
    Exceeded,

    /// Activity exactly at goal.
    Met,

    /// Activity below goal.
    Missed,
}
