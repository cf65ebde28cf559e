//! Strike resolution: one completed oath becomes one die against the
//! current enemy.

use jiff::Timestamp;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use super::Engine;
use crate::dice::{self, Actor, Target};
use crate::error::{EngineError, Result};
use crate::loot;
use crate::model::{
    ActionResult, Campaign, Enemy, EnemyKind, LogEvent, LootAward, StatusEffect, current_target,
    weapon,
};
use crate::storage;

/// What crossing into a gate enemy changed, gathered for narration.
struct GateCrossing {
    enemy_name: String,
    newly_blessed: Vec<(Uuid, String, StatusEffect)>,
    announce: bool,
}

impl Engine {
    /// Resolves one real-world oath as a strike against the current
    /// enemy.
    ///
    /// The die is drawn up front; activity credit, damage, kill
    /// consequences, and the attack entry then commit as a single
    /// transaction. Narrative entries ride after the commit and are
    /// allowed to fail.
    pub fn perform_action(&self, campaign_id: Uuid, participant_id: Uuid) -> Result<ActionResult> {
        let mut conn = self.connect(campaign_id)?;

        let campaign = storage::campaign::load(&conn)?;
        if campaign.completed {
            return Err(EngineError::CampaignComplete);
        }

        let enemies = storage::enemy::load_all(&conn)?;
        let Some(target) = current_target(&enemies, campaign.cursor).cloned() else {
            return Err(EngineError::NoLiveTarget);
        };

        let Some(striker) = storage::participant::find(&conn, participant_id)? else {
            return Err(EngineError::ParticipantNotFound(participant_id));
        };

        let raw = self.dice.d20();
        let resolution = dice::resolve(
            raw,
            &Actor {
                level: striker.level,
                weapon_bonus: weapon(striker.weapon_tier).bonus,
                status: striker.status,
            },
            &Target {
                kind: target.kind,
                remaining_vitality: target.vitality,
            },
        );

        let now = Timestamp::now();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        storage::participant::credit_strike(&tx, participant_id, raw, raw == 20, &now)?;
        if resolution.hit() {
            storage::enemy::apply_damage(&tx, target.id, resolution.damage)?;
        }

        let mut killed = false;
        let mut award = None;
        let mut gate = None;
        let mut completed_now = false;

        // The read-back plus guarded flip decides the kill race: under a
        // concurrent strike the vitality check may pass for both, but
        // only one caller flips the flag.
        if resolution.hit()
            && storage::enemy::vitality(&tx, target.id)? <= 0
            && storage::enemy::mark_defeated(&tx, target.id)?
        {
            killed = true;
            award = self.claim_loot(&tx, &target)?;

            let next_cursor = target.ordering + 1;
            storage::campaign::set_cursor(&tx, next_cursor)?;

            let after = storage::enemy::load_all(&tx)?;
            if let Some(next) = current_target(&after, next_cursor) {
                if matches!(next.kind, EnemyKind::Boss | EnemyKind::Shadow) {
                    gate = Some(evaluate_gate(&tx, &campaign, next, target.kind)?);
                }
            }
            if target.kind == EnemyKind::Boss && !campaign.endless {
                storage::campaign::set_completed(&tx, true)?;
                completed_now = true;
            }
        }

        storage::log::append(
            &tx,
            &LogEvent::Attack {
                participant_id,
                participant_name: striker.name.clone(),
                enemy_id: target.id,
                enemy_name: target.name.clone(),
                raw: resolution.raw,
                effective: resolution.effective,
                adjustment: resolution.adjustment,
                quality: resolution.quality,
                damage: resolution.damage,
                hit: resolution.hit(),
                killing_blow: killed,
            },
            now,
        )?;
        tx.commit()?;

        if killed {
            self.narrate(
                &conn,
                &LogEvent::EnemyVanquished {
                    enemy_id: target.id,
                    enemy_name: target.name.clone(),
                    by_id: participant_id,
                    by_name: striker.name.clone(),
                },
            );
            if let Some(award) = &award {
                self.narrate(
                    &conn,
                    &LogEvent::LootClaimed {
                        enemy_id: target.id,
                        winner_id: award.winner_id,
                        winner_name: award.winner_name.clone(),
                        tier: award.tier,
                        upgraded: award.upgraded,
                    },
                );
            }
            if let Some(gate) = &gate {
                for (id, name, from) in &gate.newly_blessed {
                    self.narrate(
                        &conn,
                        &LogEvent::StatusChanged {
                            participant_id: *id,
                            participant_name: name.clone(),
                            from: *from,
                            to: StatusEffect::Blessed,
                        },
                    );
                }
                if gate.announce {
                    self.narrate(
                        &conn,
                        &LogEvent::GateReached {
                            enemy_name: gate.enemy_name.clone(),
                        },
                    );
                }
            }
            if completed_now {
                self.narrate(&conn, &LogEvent::CampaignCompleted);
            }
        }

        tracing::info!(
            "{} rolled {} against {} for {} damage",
            striker.name,
            raw,
            target.name,
            resolution.damage
        );

        let snapshot = self.snapshot_and_broadcast(campaign_id, &conn)?;
        Ok(ActionResult {
            roll: resolution.raw,
            effective: resolution.effective,
            adjustment: resolution.adjustment,
            quality: resolution.quality,
            damage: resolution.damage,
            killed,
            missed: resolution.nullified,
            loot: award,
            snapshot,
        })
    }

    /// Sweeps the roster for the fallen enemy's drop and applies the
    /// upgrade when one lands.
    fn claim_loot(&self, tx: &Connection, fallen: &Enemy) -> Result<Option<LootAward>> {
        if fallen.loot_tier == 0 {
            return Ok(None);
        }
        let roster = storage::participant::load_all(tx)?;
        let Some(decision) = loot::arbitrate(&roster, fallen.loot_tier) else {
            return Ok(None);
        };
        if decision.upgraded {
            storage::participant::set_weapon_tier(tx, decision.winner.id, fallen.loot_tier)?;
        }
        storage::enemy::set_loot_winner(tx, fallen.id, decision.winner.id)?;
        Ok(Some(LootAward {
            winner_id: decision.winner.id,
            winner_name: decision.winner.name.clone(),
            winner_level: decision.winner.level,
            tier: fallen.loot_tier,
            upgraded: decision.upgraded,
        }))
    }
}

/// Crossing to a gate enemy blesses every hero whose lifetime oaths
/// cover the campaign's pace so far.
fn evaluate_gate(
    conn: &Connection,
    campaign: &Campaign,
    gate_enemy: &Enemy,
    fallen_kind: EnemyKind,
) -> storage::Result<GateCrossing> {
    let threshold = campaign
        .config
        .oaths_per_cycle
        .saturating_mul(campaign.current_cycle);

    let mut newly_blessed = Vec::new();
    for hero in storage::participant::load_all(conn)? {
        if hero.total_oaths >= threshold && hero.status != StatusEffect::Blessed {
            storage::participant::set_status(conn, hero.id, StatusEffect::Blessed)?;
            newly_blessed.push((hero.id, hero.name, hero.status));
        }
    }

    Ok(GateCrossing {
        enemy_name: gate_enemy.name.clone(),
        newly_blessed,
        announce: fallen_kind == EnemyKind::Regular,
    })
}
