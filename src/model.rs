//! Core data model for the quest engine.
//!
//! A campaign is one cooperative quest: a roster of participants converts
//! real-world activity ("oaths") into combat actions against a scripted
//! enemy queue, cycle by cycle, until the final boss falls.

mod campaign;
mod enemy;
mod log;
mod participant;
mod snapshot;
mod weapon;

pub use campaign::{Campaign, QuestConfig};
pub use enemy::{Enemy, EnemyKind, current_target};
pub use log::{LogEntry, LogEvent};
pub use participant::{Participant, StatusEffect};
pub use snapshot::{
    ActionResult, CampaignSnapshot, CycleOutcome, LootAward, ParticipantOutcome, WeeklySummary,
};
pub use weapon::{WEAPON_TIERS, Weapon, weapon};
