//! Enemy types: one encounter unit in the quest's scripted queue.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One encounter unit.
///
/// The regular/boss sequence is generated at campaign creation; shadows
/// come and go with the weekly ledger. Once defeated, an enemy stays
/// defeated unless an undo reverts the killing blow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: Uuid,
    pub name: String,
    pub description: String,

    /// Remaining vitality. May sit at or below zero after the killing
    /// strike; zero-or-less is the kill signal, not a clamped floor.
    pub vitality: i64,

    pub max_vitality: i64,

    /// Weapon tier dropped on defeat. Zero means no drop (a gate enemy).
    pub loot_tier: u8,

    /// Position in the queue. Keys can be sparse; never index by them.
    pub ordering: i64,

    pub defeated: bool,

    /// Who claimed the drop, once defeated with a loot tier.
    pub loot_winner: Option<Uuid>,

    pub kind: EnemyKind,

    /// For shadows: the participant whose missed oaths spawned this one.
    /// Surplus removal prefers a participant's own shadows.
    pub debtor: Option<Uuid>,
}

/// Encounter category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Scripted encounter from campaign creation.
    Regular,

    /// The final encounter. Takes doubled damage from a perfect roll
    /// instead of falling outright.
    Boss,

    /// Injected by the weekly ledger as a penalty for missed oaths.
    Shadow,
}

/// The single live target: lowest ordering key at or past the cursor
/// among non-defeated enemies.
///
/// Always a filtered scan, never an index lookup; keys are sparse after
/// injection and removal.
pub fn current_target(enemies: &[Enemy], cursor: i64) -> Option<&Enemy> {
    enemies
        .iter()
        .filter(|e| !e.defeated && e.ordering >= cursor)
        .min_by_key(|e| e.ordering)
}
