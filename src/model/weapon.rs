//! The weapon table: five tiers of loot, flat damage bonus per tier.

/// One weapon tier.
#[derive(Debug, Clone, Copy)]
pub struct Weapon {
    pub tier: u8,
    pub name: &'static str,

    /// Flat bonus added to every damage roll.
    pub bonus: u8,
}

/// Every equippable tier, lowest first. Tier 0 is the starting armament.
pub const WEAPON_TIERS: [Weapon; 5] = [
    Weapon {
        tier: 0,
        name: "Plain Dagger of Initial Motions",
        bonus: 0,
    },
    Weapon {
        tier: 1,
        name: "Broadsword of Grunting",
        bonus: 1,
    },
    Weapon {
        tier: 2,
        name: "Tempered Longsword",
        bonus: 2,
    },
    Weapon {
        tier: 3,
        name: "Stone Maul of Earned Mass",
        bonus: 3,
    },
    Weapon {
        tier: 4,
        name: "Legendary Dragonbane",
        bonus: 4,
    },
];

/// Looks up a tier, clamping out-of-range values to the table's ends.
pub fn weapon(tier: u8) -> &'static Weapon {
    let idx = usize::from(tier).min(WEAPON_TIERS.len() - 1);
    &WEAPON_TIERS[idx]
}
