//! Dice and modifier resolution: the pure combat math, plus the
//! injectable randomness source behind it.
//!
//! `resolve` is a pure function of the raw roll, the actor's sheet, and
//! the target; every rule here is deterministic once the d20 is drawn.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::model::{EnemyKind, StatusEffect};

/// Source of d20 draws. The engine never touches a global RNG, so every
/// combat sequence can be replayed from a seed.
pub trait DiceSource: Send + Sync {
    /// Draws a uniform integer in `[1, 20]`.
    fn d20(&self) -> u8;
}

/// ChaCha-backed dice, reproducible from a seed.
pub struct SeededDice {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededDice {
    /// Dice that replay the same sequence for the same seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Dice seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }
}

impl DiceSource for SeededDice {
    fn d20(&self) -> u8 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(1..=20)
    }
}

/// Scripted dice for tests: pops queued rolls, then falls back to 10.
///
/// Clones share the same queue, so a test can keep a handle while the
/// engine owns the boxed source.
#[cfg(test)]
#[derive(Clone)]
pub struct ScriptedDice {
    rolls: std::sync::Arc<Mutex<std::collections::VecDeque<u8>>>,
}

#[cfg(test)]
impl ScriptedDice {
    pub fn new(rolls: &[u8]) -> Self {
        Self {
            rolls: std::sync::Arc::new(Mutex::new(rolls.iter().copied().collect())),
        }
    }

    pub fn queue(&self, rolls: &[u8]) {
        let mut q = self.rolls.lock().unwrap();
        q.extend(rolls.iter().copied());
    }
}

#[cfg(test)]
impl DiceSource for ScriptedDice {
    fn d20(&self) -> u8 {
        self.rolls.lock().unwrap().pop_front().unwrap_or(10)
    }
}

/// Why an effective roll differs from the raw one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollAdjustment {
    /// A raw 1 was raised to 2 for an inspired or blessed actor.
    FumbleAverted,

    /// A raw 20 was lowered to 19 for a cursed actor.
    CritDenied,
}

/// Band of the effective roll, as shown in the chronicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitQuality {
    /// Effective 1: the strike is nullified.
    Miss,

    /// Effective 2-5.
    Glancing,

    /// Effective 6-10.
    Solid,

    /// Effective 11-15.
    Strong,

    /// Effective 16-19.
    Critical,

    /// Effective 20, or a blessed strike against a shadow.
    AutoKill,
}

/// The actor's combat sheet.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub level: u32,
    pub weapon_bonus: u8,
    pub status: StatusEffect,
}

/// What is being struck.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub kind: EnemyKind,
    pub remaining_vitality: i64,
}

/// One fully resolved strike.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub raw: u8,
    pub effective: u8,
    pub adjustment: Option<RollAdjustment>,
    pub quality: HitQuality,
    pub damage: i64,

    /// Damage was set to exactly the target's remaining vitality.
    pub auto_kill: bool,

    /// The strike did nothing.
    pub nullified: bool,
}

impl Resolution {
    /// Whether any damage landed.
    pub fn hit(&self) -> bool {
        self.damage > 0
    }
}

/// Resolves a raw d20 into an effective roll and damage.
///
/// Rule order: status modification first (fumble averted, crit denied),
/// then the blessed-versus-shadow auto-slay, then the effective-20 and
/// effective-1 extremes, then the standard formula
/// `effective + level + weapon bonus`.
pub fn resolve(raw: u8, actor: &Actor, target: &Target) -> Resolution {
    let (effective, adjustment) = adjust(raw, actor.status);
    let remaining = target.remaining_vitality.max(0);

    // Blessed payoff for full attendance: shadows fall to any roll that
    // isn't an outright fumble.
    if actor.status == StatusEffect::Blessed
        && target.kind == EnemyKind::Shadow
        && effective >= 2
    {
        return Resolution {
            raw,
            effective,
            adjustment,
            quality: HitQuality::AutoKill,
            damage: remaining,
            auto_kill: true,
            nullified: false,
        };
    }

    if effective == 20 {
        // A perfect roll fells anything but the boss, which instead takes
        // doubled damage capped at its remaining vitality.
        let (damage, auto_kill) = if target.kind == EnemyKind::Boss {
            ((2 * formula(20, actor)).min(remaining), false)
        } else {
            (remaining, true)
        };
        return Resolution {
            raw,
            effective,
            adjustment,
            quality: HitQuality::AutoKill,
            damage,
            auto_kill,
            nullified: false,
        };
    }

    if effective == 1 {
        return Resolution {
            raw,
            effective,
            adjustment,
            quality: HitQuality::Miss,
            damage: 0,
            auto_kill: false,
            nullified: true,
        };
    }

    Resolution {
        raw,
        effective,
        adjustment,
        quality: quality_of(effective),
        damage: formula(effective, actor),
        auto_kill: false,
        nullified: false,
    }
}

/// Applies status modification to the raw roll.
fn adjust(raw: u8, status: StatusEffect) -> (u8, Option<RollAdjustment>) {
    if raw == 1 && status.averts_fumble() {
        return (2, Some(RollAdjustment::FumbleAverted));
    }
    if raw == 20 && status.denies_crit() {
        return (19, Some(RollAdjustment::CritDenied));
    }
    (raw, None)
}

/// Standard damage: effective roll + level + weapon bonus.
fn formula(effective: u8, actor: &Actor) -> i64 {
    i64::from(effective) + i64::from(actor.level) + i64::from(actor.weapon_bonus)
}

fn quality_of(effective: u8) -> HitQuality {
    match effective {
        1 => HitQuality::Miss,
        2..=5 => HitQuality::Glancing,
        6..=10 => HitQuality::Solid,
        11..=15 => HitQuality::Strong,
        16..=19 => HitQuality::Critical,
        _ => HitQuality::AutoKill,
    }
}
