//! Gjallar turns real-world commitments into a cooperative quest.
//!
//! Each participant's completed oath becomes one d20 strike against the
//! current enemy in a scripted queue. Weekly resolution judges every
//! hero against the shared activity goal, converts the party's net
//! shortfall into shadow enemies blocking the final boss, and lets net
//! surplus banish them again.
//!
//! The [`Engine`] is the only entry point. It persists each campaign in
//! its own `SQLite` file and treats the store as the single
//! serialization point, so concurrent strikes from different
//! connections stay consistent without any in-process locking.
//!
//! ```no_run
//! use gjallar::{CampaignSeed, Engine, Storage};
//!
//! # fn main() -> gjallar::Result<()> {
//! let engine = Engine::with_defaults(Storage::new("./campaigns")?);
//! let snapshot = engine.create_campaign(CampaignSeed {
//!     name: "March of the Unbroken".into(),
//!     cycles: 6,
//!     oaths_per_cycle: 3,
//!     heroes: vec!["Ari".into(), "Brenna".into()],
//!     first_enemy: None,
//!     endless: false,
//! })?;
//! let hero = snapshot.participants[0].id;
//! let result = engine.perform_action(snapshot.campaign.id, hero)?;
//! println!("rolled {} for {} damage", result.roll, result.damage);
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod content;
pub mod dice;
pub mod engine;
pub mod error;
pub mod loot;
pub mod model;
pub mod storage;

pub use broadcast::{Broadcast, NullBroadcast};
pub use content::{ContentPool, EnemyTemplate, Mood, StaticPool};
pub use dice::{DiceSource, HitQuality, RollAdjustment, SeededDice};
pub use engine::{CampaignSeed, Engine};
pub use error::{EngineError, ErrorKind, Result};
pub use model::{
    ActionResult, Campaign, CampaignSnapshot, CycleOutcome, Enemy, EnemyKind, LogEntry, LogEvent,
    LootAward, Participant, ParticipantOutcome, QuestConfig, StatusEffect, WeeklySummary,
};
pub use storage::Storage;
