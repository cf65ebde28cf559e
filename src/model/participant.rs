//! Participant types: one hero on the roster.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One human player within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,

    /// Strength, added to every damage roll. Starts at 1 and grows by one
    /// per cycle in which the goal was met or exceeded.
    pub level: u32,

    /// Equipped weapon tier; see [`crate::model::weapon`].
    pub weapon_tier: u8,

    /// Lifetime activity count.
    pub total_oaths: u32,

    /// Activity within the current cycle. Resets to zero only at weekly
    /// resolution.
    pub cycle_oaths: u32,

    pub status: StatusEffect,

    /// Sum of every raw die rolled this campaign. Primary loot key.
    pub bounty_score: u32,

    /// Count of maximum-value (20) raw rolls. Second loot key.
    pub max_roll_count: u32,

    /// Highest single raw roll ever recorded. Third loot key.
    pub highest_roll: u8,

    /// When the bounty score last changed. Earlier wins loot ties.
    pub bounty_updated_at: Timestamp,

    pub enlisted_at: Timestamp,
}

/// Participant standing, transitioned by weekly resolution and the
/// late-campaign gate. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// No modifier in play.
    Sustained,

    /// Goal exceeded last cycle: a raw 1 is raised to 2.
    Inspired,

    /// Goal missed last cycle: a raw 20 is lowered to 19.
    Cursed,

    /// Full attendance into the late segment: fumbles are averted and any
    /// successful roll slays a shadow outright.
    Blessed,
}

impl StatusEffect {
    /// Whether a raw 1 is raised to 2 instead of nullifying the strike.
    pub fn averts_fumble(self) -> bool {
        matches!(self, Self::Inspired | Self::Blessed)
    }

    /// Whether a raw 20 is lowered to 19, denying the automatic kill.
    pub fn denies_crit(self) -> bool {
        matches!(self, Self::Cursed)
    }
}
