//! Campaign lifecycle: forging, roster changes, renames, snapshots.

use jiff::Timestamp;
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use super::Engine;
use crate::content::{EnemyTemplate, Mood};
use crate::error::{EngineError, Result};
use crate::model::{
    Campaign, CampaignSnapshot, Enemy, EnemyKind, LogEvent, Participant, QuestConfig,
    StatusEffect,
};
use crate::storage::{self, StorageError};

/// The final boss sits at a sparse ordering key so weekly shadows can be
/// slotted in front of it without renumbering the queue.
const FINAL_BOSS_ORDERING: i64 = 500;

/// Forging bounds. Generous for any real party, and tight enough that
/// the queue-sizing arithmetic stays comfortably inside `u64`.
const MAX_ROSTER: usize = 50;
const MAX_CYCLES: u32 = 520;
const MAX_OATHS_PER_CYCLE: u32 = 100;

/// Everything needed to forge a new campaign.
#[derive(Debug, Clone)]
pub struct CampaignSeed {
    pub name: String,
    /// How many weekly cycles the quest is meant to span.
    pub cycles: u32,
    /// Per-hero activity goal for each cycle.
    pub oaths_per_cycle: u32,
    pub heroes: Vec<String>,
    /// Replaces the generated name and description of the first enemy.
    pub first_enemy: Option<EnemyTemplate>,
    /// Endless campaigns never complete; felling the boss leaves the
    /// queue open for shadows.
    pub endless: bool,
}

impl Engine {
    /// Forges a campaign: sizes the enemy queue to the party's committed
    /// activity, enlists the founding roster, and writes the whole thing
    /// in one transaction.
    pub fn create_campaign(&self, seed: CampaignSeed) -> Result<CampaignSnapshot> {
        let name = seed.name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("campaign name is required".into()));
        }

        let heroes: Vec<&str> = seed
            .heroes
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();
        if heroes.is_empty() {
            return Err(EngineError::Validation("at least one hero is required".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for hero in &heroes {
            if !seen.insert(*hero) {
                return Err(EngineError::Validation(format!("duplicate hero name: {hero}")));
            }
        }

        if seed.cycles == 0 || seed.oaths_per_cycle == 0 {
            return Err(EngineError::Validation(
                "cycle count and weekly goal must be positive".into(),
            ));
        }
        if heroes.len() > MAX_ROSTER
            || seed.cycles > MAX_CYCLES
            || seed.oaths_per_cycle > MAX_OATHS_PER_CYCLE
        {
            return Err(EngineError::Validation(format!(
                "at most {MAX_ROSTER} heroes, {MAX_CYCLES} cycles, and \
                 {MAX_OATHS_PER_CYCLE} oaths per cycle"
            )));
        }

        let config = QuestConfig {
            cycles: seed.cycles,
            oaths_per_cycle: seed.oaths_per_cycle,
            roster_size: u32::try_from(heroes.len())
                .map_err(|_| EngineError::Validation("roster is too large".into()))?,
        };

        let id = Uuid::new_v4();
        let now = Timestamp::now();
        let campaign = Campaign {
            id,
            name: name.to_string(),
            config,
            current_cycle: 1,
            cursor: 0,
            completed: false,
            endless: seed.endless,
            created_at: now,
        };

        let roster: Vec<Participant> = heroes
            .iter()
            .map(|hero| Participant {
                id: Uuid::new_v4(),
                name: (*hero).to_string(),
                level: 1,
                weapon_tier: 0,
                total_oaths: 0,
                cycle_oaths: 0,
                status: StatusEffect::Sustained,
                bounty_score: 0,
                max_roll_count: 0,
                highest_roll: 0,
                bounty_updated_at: now,
                enlisted_at: now,
            })
            .collect();

        let enemies = self.spawn_queue(&config, seed.first_enemy);

        let mut conn = self.storage.create_db(id)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        storage::campaign::insert(&tx, &campaign)?;
        for hero in &roster {
            storage::participant::insert(&tx, hero)?;
        }
        for enemy in &enemies {
            storage::enemy::insert(&tx, enemy)?;
        }
        storage::log::append(
            &tx,
            &LogEvent::CampaignCreated {
                name: campaign.name.clone(),
            },
            now,
        )?;
        tx.commit()?;

        tracing::info!(
            "forged campaign {} with {} heroes and {} enemies",
            campaign.name,
            roster.len(),
            enemies.len()
        );
        self.snapshot_and_broadcast(id, &conn)
    }

    /// Adds a hero mid-campaign with fresh counters.
    pub fn enlist_hero(&self, campaign_id: Uuid, name: &str) -> Result<Participant> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("hero name is required".into()));
        }

        let conn = self.connect(campaign_id)?;
        let roster = storage::participant::load_all(&conn)?;
        if roster.iter().any(|p| p.name == name) {
            return Err(EngineError::Validation(format!(
                "a hero named {name} is already enlisted"
            )));
        }
        if roster.len() >= MAX_ROSTER {
            return Err(EngineError::Validation(format!(
                "the roster is full at {MAX_ROSTER} heroes"
            )));
        }

        let now = Timestamp::now();
        let hero = Participant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            level: 1,
            weapon_tier: 0,
            total_oaths: 0,
            cycle_oaths: 0,
            status: StatusEffect::Sustained,
            bounty_score: 0,
            max_roll_count: 0,
            highest_roll: 0,
            bounty_updated_at: now,
            enlisted_at: now,
        };
        storage::participant::insert(&conn, &hero)?;

        self.narrate(
            &conn,
            &LogEvent::HeroEnlisted {
                participant_id: hero.id,
                name: hero.name.clone(),
            },
        );
        tracing::info!("enlisted {} into campaign {campaign_id}", hero.name);
        self.snapshot_and_broadcast(campaign_id, &conn)?;
        Ok(hero)
    }

    /// Removes a hero outright. Their past strikes stay in the
    /// chronicle; their shadows stay in the queue, debts and all.
    pub fn retire_hero(&self, campaign_id: Uuid, participant_id: Uuid) -> Result<()> {
        let conn = self.connect(campaign_id)?;
        let Some(hero) = storage::participant::find(&conn, participant_id)? else {
            return Err(EngineError::ParticipantNotFound(participant_id));
        };
        storage::participant::remove(&conn, participant_id)?;

        self.narrate(
            &conn,
            &LogEvent::HeroRetired {
                participant_id,
                name: hero.name.clone(),
            },
        );
        tracing::info!("retired {} from campaign {campaign_id}", hero.name);
        self.snapshot_and_broadcast(campaign_id, &conn)?;
        Ok(())
    }

    /// Renames the enemy at an ordering key, keeping its stats.
    pub fn rename_enemy(
        &self,
        campaign_id: Uuid,
        ordering: i64,
        name: &str,
        description: &str,
    ) -> Result<Enemy> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("enemy name is required".into()));
        }

        let conn = self.connect(campaign_id)?;
        if !storage::enemy::update_flavor(&conn, ordering, name, description.trim())? {
            return Err(EngineError::EnemyNotFound(ordering));
        }
        let enemy = storage::enemy::find_by_ordering(&conn, ordering)?
            .ok_or(EngineError::EnemyNotFound(ordering))?;

        self.narrate(
            &conn,
            &LogEvent::EnemyRenamed {
                enemy_id: enemy.id,
                name: enemy.name.clone(),
            },
        );
        self.snapshot_and_broadcast(campaign_id, &conn)?;
        Ok(enemy)
    }

    /// The full client-facing view of one campaign.
    pub fn fetch(&self, campaign_id: Uuid) -> Result<CampaignSnapshot> {
        let conn = self.connect(campaign_id)?;
        Ok(storage::load_snapshot(&conn)?)
    }

    /// Every campaign under the storage root, oldest first.
    pub fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.storage.list_campaigns()?)
    }

    /// Deletes a campaign and everything in it.
    pub fn abandon_campaign(&self, campaign_id: Uuid) -> Result<()> {
        self.storage.delete_db(campaign_id).map_err(|e| match e {
            StorageError::CampaignNotFound(id) => EngineError::CampaignNotFound(id),
            other => EngineError::Storage(other),
        })?;
        tracing::info!("abandoned campaign {campaign_id}");
        Ok(())
    }

    /// Builds the enemy queue for a fresh campaign.
    ///
    /// The queue is sized so that steady participation clears it: the
    /// party's total committed strikes, at one instant kill per twenty
    /// rolls, should fell roughly every fifth regular. Vitality budgets
    /// spend the party's expected damage output at each point of the
    /// march, discounted below perfect attendance.
    fn spawn_queue(&self, config: &QuestConfig, first_enemy: Option<EnemyTemplate>) -> Vec<Enemy> {
        let total_actions = u64::from(config.roster_size)
            * u64::from(config.oaths_per_cycle)
            * u64::from(config.cycles);

        // round(total / 20 / 0.2), clamped to one enemy per cycle at the
        // low end and four per cycle at the high end.
        let normals = u32::try_from((total_actions + 2) / 4)
            .unwrap_or(u32::MAX)
            .clamp(config.cycles, config.cycles.saturating_mul(4));

        let mut first_enemy = first_enemy;
        let mut enemies = Vec::with_capacity(normals as usize + 1);
        let span = u64::from(normals.saturating_sub(1)).max(1);

        for i in 0..u64::from(normals) {
            // March progress in fifths and twentieths of the way to the
            // boss, kept in integers.
            let content_tier = if 5 * i < span {
                1
            } else if 5 * i < 2 * span {
                2
            } else if 5 * i < 3 * span {
                3
            } else if 5 * i < 4 * span {
                4
            } else {
                5
            };
            let loot_tier = if 4 * i < span {
                1
            } else if 20 * i < 11 * span {
                2
            } else {
                3
            };
            let expected_level = 1 + round_div(i * u64::from(config.cycles - 1), span);

            let template = if i == 0 { first_enemy.take() } else { None }
                .unwrap_or_else(|| self.content.enemy_template(content_tier, self.coin()));

            let vitality = vitality_budget(
                total_actions,
                6,
                10 * u64::from(normals),
                expected_level,
                loot_tier,
            );
            enemies.push(Enemy {
                id: Uuid::new_v4(),
                name: template.name,
                description: template.description,
                vitality,
                max_vitality: vitality,
                loot_tier,
                ordering: i64::try_from(i).unwrap_or(i64::MAX),
                defeated: false,
                loot_winner: None,
                kind: EnemyKind::Regular,
                debtor: None,
            });
        }

        let boss_template = self.content.enemy_template(6, self.coin());
        let boss_vitality = vitality_budget(total_actions, 4, 10, u64::from(config.cycles), 4);
        enemies.push(Enemy {
            id: Uuid::new_v4(),
            name: boss_template.name,
            description: boss_template.description,
            vitality: boss_vitality,
            max_vitality: boss_vitality,
            loot_tier: 4,
            ordering: FINAL_BOSS_ORDERING,
            defeated: false,
            loot_winner: None,
            kind: EnemyKind::Boss,
            debtor: None,
        });
        enemies
    }

    /// A coin flip off the shared d20, weighting grim and wry evenly.
    fn coin(&self) -> Mood {
        if self.dice.d20() > 10 {
            Mood::Wry
        } else {
            Mood::Grim
        }
    }
}

/// `ceil(total * (share_num / share_den) * (10.5 + level + loot_tier) * 0.7)`,
/// floored at ten points, computed entirely in integers.
fn vitality_budget(
    total_actions: u64,
    share_num: u64,
    share_den: u64,
    expected_level: u64,
    loot_tier: u8,
) -> i64 {
    let avg_strike_tenths = 105 + 10 * expected_level + 10 * u64::from(loot_tier);
    let num = total_actions * share_num * avg_strike_tenths * 7;
    let den = share_den * 100;
    let budget = num.div_ceil(den).max(10);
    i64::try_from(budget).unwrap_or(i64::MAX)
}

/// Integer `round(a / b)`, rounding halves up.
fn round_div(a: u64, b: u64) -> u64 {
    (2 * a + b) / (2 * b)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::broadcast::RecordingBroadcast;
    use crate::content::StaticPool;
    use crate::dice::ScriptedDice;
    use crate::storage::Storage;

    fn test_engine() -> (TempDir, Engine, ScriptedDice, RecordingBroadcast) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("campaigns")).unwrap();
        let dice = ScriptedDice::new(&[]);
        let broadcast = RecordingBroadcast::default();
        let engine = Engine::new(
            storage,
            Box::new(dice.clone()),
            Box::new(StaticPool::new()),
            Box::new(broadcast.clone()),
        );
        (dir, engine, dice, broadcast)
    }

    fn seed(heroes: &[&str]) -> CampaignSeed {
        CampaignSeed {
            name: "The Gjallar March".into(),
            cycles: 4,
            oaths_per_cycle: 3,
            heroes: heroes.iter().map(|h| (*h).to_string()).collect(),
            first_enemy: None,
            endless: false,
        }
    }

    #[test]
    fn forged_queue_has_expected_shape() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        // 2 heroes * 3 oaths * 4 cycles = 24 committed strikes -> 6
        // regulars plus the boss.
        let snapshot = engine.create_campaign(seed(&["Ari", "Brenna"])).unwrap();

        assert_eq!(snapshot.enemies.len(), 7);
        let boss = snapshot.enemies.last().unwrap();
        assert_eq!(boss.kind, EnemyKind::Boss);
        assert_eq!(boss.ordering, 500);
        assert_eq!(boss.loot_tier, 4);
        assert_eq!(boss.vitality, 125);
        assert_eq!(boss.vitality, boss.max_vitality);

        let opener = &snapshot.enemies[0];
        assert_eq!(opener.kind, EnemyKind::Regular);
        assert_eq!(opener.ordering, 0);
        assert_eq!(opener.loot_tier, 1);
        assert_eq!(opener.vitality, 21);

        // Drop tiers ramp along the march.
        let loot: Vec<u8> = snapshot.enemies.iter().map(|e| e.loot_tier).collect();
        assert_eq!(loot, vec![1, 1, 2, 3, 3, 3, 4]);

        assert_eq!(snapshot.campaign.current_cycle, 1);
        assert_eq!(snapshot.campaign.cursor, 0);
        assert_eq!(snapshot.participants.len(), 2);
        assert!(snapshot.participants.iter().all(|p| p.level == 1));
        assert!(
            snapshot
                .log
                .iter()
                .any(|e| matches!(e.event, LogEvent::CampaignCreated { .. }))
        );
    }

    #[test]
    fn tiny_commitment_still_yields_one_enemy_per_cycle() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        let mut s = seed(&["Solo"]);
        s.oaths_per_cycle = 1;
        let snapshot = engine.create_campaign(s).unwrap();

        // 4 committed strikes round to a single regular, clamped up to
        // one per cycle.
        assert_eq!(snapshot.enemies.len(), 5);
        assert!(snapshot.enemies.iter().all(|e| e.vitality >= 10));
    }

    #[test]
    fn first_enemy_override_lands_on_the_opener() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        let mut s = seed(&["Ari"]);
        s.first_enemy = Some(EnemyTemplate {
            name: "The Inbox".into(),
            description: "It refills overnight.".into(),
        });
        let snapshot = engine.create_campaign(s).unwrap();

        assert_eq!(snapshot.enemies[0].name, "The Inbox");
        assert_ne!(snapshot.enemies[1].name, "The Inbox");
    }

    #[test]
    fn create_rejects_bad_seeds() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        let mut blank = seed(&["Ari"]);
        blank.name = "  ".into();
        assert!(matches!(
            engine.create_campaign(blank),
            Err(EngineError::Validation(_))
        ));

        assert!(matches!(
            engine.create_campaign(seed(&[])),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.create_campaign(seed(&["Ari", " Ari "])),
            Err(EngineError::Validation(_))
        ));

        let mut zero = seed(&["Ari"]);
        zero.oaths_per_cycle = 0;
        assert!(matches!(
            engine.create_campaign(zero),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn forging_bounds_are_enforced() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        let mut crowded = seed(&[]);
        crowded.heroes = (1..=51).map(|i| format!("Hero {i}")).collect();
        assert!(matches!(
            engine.create_campaign(crowded),
            Err(EngineError::Validation(_))
        ));

        let mut marathon = seed(&["Ari"]);
        marathon.cycles = 521;
        assert!(matches!(
            engine.create_campaign(marathon),
            Err(EngineError::Validation(_))
        ));

        let mut sleepless = seed(&["Ari"]);
        sleepless.oaths_per_cycle = 101;
        assert!(matches!(
            engine.create_campaign(sleepless),
            Err(EngineError::Validation(_))
        ));

        // The largest admissible seed still forges, with the queue
        // clamped to four regulars per cycle.
        let mut grand = seed(&[]);
        grand.heroes = (1..=50).map(|i| format!("Hero {i}")).collect();
        grand.cycles = 520;
        grand.oaths_per_cycle = 100;
        let snapshot = engine.create_campaign(grand).unwrap();
        assert_eq!(snapshot.enemies.len(), 4 * 520 + 1);
        assert!(snapshot.enemies.iter().all(|e| e.vitality >= 10));

        // A full roster takes no latecomers.
        assert!(matches!(
            engine.enlist_hero(snapshot.campaign.id, "Latecomer"),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn enlist_and_retire_heroes() {
        let (_dir, engine, _dice, _broadcast) = test_engine();
        let snapshot = engine.create_campaign(seed(&["Ari"])).unwrap();
        let id = snapshot.campaign.id;

        let hero = engine.enlist_hero(id, " Brenna ").unwrap();
        assert_eq!(hero.name, "Brenna");
        assert_eq!(hero.level, 1);
        assert!(matches!(
            engine.enlist_hero(id, "Brenna"),
            Err(EngineError::Validation(_))
        ));

        engine.retire_hero(id, hero.id).unwrap();
        assert!(matches!(
            engine.retire_hero(id, hero.id),
            Err(EngineError::ParticipantNotFound(_))
        ));

        let roster = engine.fetch(id).unwrap().participants;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Ari");
    }

    #[test]
    fn rename_enemy_hits_by_ordering() {
        let (_dir, engine, _dice, _broadcast) = test_engine();
        let snapshot = engine.create_campaign(seed(&["Ari"])).unwrap();
        let id = snapshot.campaign.id;

        let renamed = engine
            .rename_enemy(id, 500, "The Quarterly Review", "It has slides.")
            .unwrap();
        assert_eq!(renamed.name, "The Quarterly Review");
        assert_eq!(renamed.kind, EnemyKind::Boss);

        assert!(matches!(
            engine.rename_enemy(id, 999, "Nobody", ""),
            Err(EngineError::EnemyNotFound(999))
        ));
        assert!(matches!(
            engine.rename_enemy(id, 500, "   ", ""),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn list_and_abandon_campaigns() {
        let (_dir, engine, _dice, _broadcast) = test_engine();

        let first = engine.create_campaign(seed(&["Ari"])).unwrap();
        let mut second_seed = seed(&["Brenna"]);
        second_seed.name = "Second March".into();
        let second = engine.create_campaign(second_seed).unwrap();

        let ids: Vec<Uuid> = engine
            .list_campaigns()
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert!(ids.contains(&first.campaign.id));
        assert!(ids.contains(&second.campaign.id));

        engine.abandon_campaign(first.campaign.id).unwrap();
        assert!(matches!(
            engine.fetch(first.campaign.id),
            Err(EngineError::CampaignNotFound(_))
        ));
        assert!(matches!(
            engine.abandon_campaign(first.campaign.id),
            Err(EngineError::CampaignNotFound(_))
        ));
    }

    #[test]
    fn every_mutation_broadcasts_a_snapshot() {
        let (_dir, engine, _dice, broadcast) = test_engine();
        let snapshot = engine.create_campaign(seed(&["Ari"])).unwrap();
        let id = snapshot.campaign.id;

        engine.enlist_hero(id, "Brenna").unwrap();
        engine.rename_enemy(id, 0, "The Laundry Pile", "").unwrap();

        let published = broadcast.published();
        assert_eq!(published.len(), 3);
        assert!(published.iter().all(|(c, _)| *c == id));
        assert_eq!(published[2].1.participants.len(), 2);
    }
}
