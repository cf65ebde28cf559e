//! Enemy flavor: the content-pool collaborator and a built-in static pool.
//!
//! The engine never invents names itself; it asks the pool for a template
//! at campaign creation and whenever the weekly ledger injects shadows.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// A name and description for a freshly revealed enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub description: String,
}

/// Register requested for a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Grim,
    Wry,
}

/// Provider of enemy flavor.
pub trait ContentPool: Send + Sync {
    /// A template for a scripted enemy of the given content tier, 1 to 6,
    /// where 6 is the final-boss band. Out-of-range tiers clamp.
    fn enemy_template(&self, tier: u8, mood: Mood) -> EnemyTemplate;

    /// A template for an injected shadow, named after the participant
    /// whose missed oaths spawned it when one is known.
    fn shadow_template(&self, debtor: Option<&str>) -> EnemyTemplate;
}

type Pool = &'static [(&'static str, &'static str)];

const GRIM: [Pool; 6] = [
    &[
        (
            "Goblin Scout",
            "A nimble nuisance with a jagged blade and a nervous twitch.",
        ),
        (
            "Slime of Stagnation",
            "A pulsing green blob that smells of old gym bags and lost momentum.",
        ),
        (
            "Skeletal Trainee",
            "The remains of a warrior who forgot to stretch. Rattles with every step.",
        ),
    ],
    &[
        (
            "Orc-Bear",
            "Half orc, half bear, all problem.",
        ),
        (
            "Hobgoblin Captain",
            "A disciplined commander who leads with iron-clad strikes.",
        ),
        (
            "Iron-Hided Boar",
            "A massive beast that charges with the force of a falling anvil.",
        ),
    ],
    &[
        (
            "Mist-Stalking Wraith",
            "A spectral horror that drains the warmth from your muscles.",
        ),
        (
            "Living Shadow",
            "A dark entity that mimics your movements, waiting for a moment of weakness.",
        ),
        (
            "Cursed Plate Armor",
            "A hollow suit of steel that fights with the memories of its fallen owner.",
        ),
    ],
    &[
        (
            "Eldritch Mindflayer",
            "A tentacled horror that seeks to consume your focus and ambition.",
        ),
        (
            "Chimera of Doubt",
            "Three heads, each whispering a reason why you should stop.",
        ),
        (
            "Void Stalker",
            "A shadow that feeds on the heat of your exertion.",
        ),
    ],
    &[
        (
            "Frost Titan",
            "A mountain of ice that seeks to freeze the forge forever.",
        ),
        (
            "Iron Golem",
            "A massive construct of pure resilience. It does not tire.",
        ),
        (
            "Plateau Giant",
            "A vast creature that insists nothing has changed, despite clear evidence.",
        ),
    ],
    &[
        (
            "Ancient Cinder Dragon",
            "The ultimate lord of the forge. Its scales are tempered in a thousand cycles.",
        ),
        (
            "Gjallar-Blight Wyrm",
            "A catastrophic beast of infinite greed that has swallowed whole civilizations of effort.",
        ),
        (
            "Void-Scale Devourer",
            "A dragon of pure absence, eating the very light of your ambition.",
        ),
    ],
];

const WRY: [Pool; 6] = [
    &[
        (
            "Goblin of Mild Inconvenience",
            "Thrives on trivial obstacles such as weather or missing socks.",
        ),
        (
            "Warm-Up Wraith",
            "Encourages haste now and regret later with its chilly presence.",
        ),
        (
            "Sir Reginald the Nearly Fit",
            "Has been getting back into it since the previous king's reign.",
        ),
    ],
    &[
        (
            "Sir Skips-Leg-Day",
            "Broad of chest, narrow of stance, and deeply suspicious of squats.",
        ),
        (
            "Barbell Mimic",
            "Appears manageable until touched, at which point it becomes emotionally heavier than expected.",
        ),
        (
            "Duke of Poor Form",
            "Once noble, now permanently bent. Offers advice with alarming confidence.",
        ),
    ],
    &[
        (
            "Wobbly Lich of Lost Motivation",
            "An ancient being sustained entirely by waiting to feel ready.",
        ),
        (
            "Cardio Banshee",
            "Its shriek can be heard whenever running is mentioned casually.",
        ),
        (
            "The Ghost of January 1st",
            "Possesses great energy, only to vanish after three weeks.",
        ),
    ],
    &[
        (
            "Overthinking Beholder",
            "Each eye projects a different plan. None of them involve starting.",
        ),
        (
            "Snacking Hydra",
            "Cut one craving down and two more appear, each louder than the last.",
        ),
        (
            "The Sentient Sweat-Towel",
            "Damp, heavy, and clings to you with unwanted affection.",
        ),
    ],
    &[
        (
            "The Titan of Tainted Protein",
            "A massive biological horror that smells faintly of spoiled vanilla.",
        ),
        (
            "Ogre of Overdoing It",
            "Believes more is always better and rest is cowardice.",
        ),
        (
            "The Hoarder of Hex-Dumbbells",
            "Surrounded by a fortress of paired weights it will never use.",
        ),
    ],
    &[
        (
            "The Squat-Thrust Wyrm",
            "A massive dragon that only attacks after a punishing set of descent and ascent.",
        ),
        (
            "The Cardio-Cramp Drake",
            "A spindly, frantic dragon that causes side-splitting pain by looking at it.",
        ),
        (
            "Deadlift Dread-King",
            "A dragon made of solid granite plates. Lifting its gaze is harder than lifting its tail.",
        ),
    ],
];

const SHADOW_DESCRIPTION: &str =
    "A silhouette of missed oaths. It grows bolder with every skipped day.";

/// Built-in pool cycling a fixed roster of templates per tier and mood.
pub struct StaticPool {
    cursor: Mutex<usize>,
}

impl StaticPool {
    pub fn new() -> Self {
        Self {
            cursor: Mutex::new(0),
        }
    }

    fn next_index(&self) -> usize {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let idx = *cursor;
        *cursor = cursor.wrapping_add(1);
        idx
    }
}

impl Default for StaticPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentPool for StaticPool {
    fn enemy_template(&self, tier: u8, mood: Mood) -> EnemyTemplate {
        let band = usize::from(tier.clamp(1, 6)) - 1;
        let pool = match mood {
            Mood::Grim => GRIM[band],
            Mood::Wry => WRY[band],
        };
        let (name, description) = pool[self.next_index() % pool.len()];
        EnemyTemplate {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    fn shadow_template(&self, debtor: Option<&str>) -> EnemyTemplate {
        let name = match debtor {
            Some(debtor) => format!("The Shadow of {debtor}"),
            None => "A Nameless Shadow".to_string(),
        };
        EnemyTemplate {
            name,
            description: SHADOW_DESCRIPTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_cycles_instead_of_repeating() {
        let pool = StaticPool::new();
        let first = pool.enemy_template(1, Mood::Grim);
        let second = pool.enemy_template(1, Mood::Grim);
        assert_ne!(first.name, second.name);
    }

    #[test]
    fn tier_clamps_to_the_table() {
        let pool = StaticPool::new();
        let t = pool.enemy_template(0, Mood::Grim);
        assert!(!t.name.is_empty());
        let t = pool.enemy_template(99, Mood::Wry);
        assert!(!t.name.is_empty());
    }

    #[test]
    fn shadow_is_named_after_its_debtor() {
        let pool = StaticPool::new();
        let t = pool.shadow_template(Some("Astrid"));
        assert_eq!(t.name, "The Shadow of Astrid");
        let t = pool.shadow_template(None);
        assert_eq!(t.name, "A Nameless Shadow");
    }
}
