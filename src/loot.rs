//! Loot arbitration under the Fair Sweat Rule.
//!
//! Pure functions over a roster snapshot; the engine persists whatever
//! tier change the decision calls for.

use crate::model::Participant;

/// The outcome of arbitration for one drop.
#[derive(Debug, Clone, Copy)]
pub struct LootDecision<'a> {
    pub winner: &'a Participant,

    /// True when the winner's equipped tier should be raised to the
    /// offered tier; false for a prestige-only award.
    pub upgraded: bool,
}

/// Orders the roster by the Fair Sweat Rule, best claim first: bounty
/// score, then count of maximum rolls, then highest single roll, then
/// earliest bounty timestamp (consistency beats a last-second spike).
pub fn fair_sweat_order(roster: &[Participant]) -> Vec<&Participant> {
    let mut ranked: Vec<&Participant> = roster.iter().collect();
    ranked.sort_by(|a, b| {
        b.bounty_score
            .cmp(&a.bounty_score)
            .then_with(|| b.max_roll_count.cmp(&a.max_roll_count))
            .then_with(|| b.highest_roll.cmp(&a.highest_roll))
            .then_with(|| a.bounty_updated_at.cmp(&b.bounty_updated_at))
    });
    ranked
}

/// Picks the winner for a drop of the offered tier.
///
/// The first ranked participant whose equipped tier is strictly below the
/// offer takes the upgrade; if everyone already carries this tier or
/// better, the top claim wins as prestige with no armament change.
pub fn arbitrate(roster: &[Participant], offered_tier: u8) -> Option<LootDecision<'_>> {
    let ranked = fair_sweat_order(roster);
    if let Some(&winner) = ranked.iter().find(|p| p.weapon_tier < offered_tier) {
        return Some(LootDecision {
            winner,
            upgraded: true,
        });
    }
    ranked.first().map(|&winner| LootDecision {
        winner,
        upgraded: false,
    })
}
