//! Weekly resolution: verdicts, level-ups, and the shadow ledger.
//!
//! The week is judged as one net ledger. Required oaths are the goal
//! times the roster; whatever the party delivered on top covers
//! whoever fell short. Only the net deficit becomes shadows, and only
//! the net surplus banishes them.

use std::cmp::Ordering;

use rusqlite::TransactionBehavior;
use uuid::Uuid;

use super::Engine;
use crate::content::ContentPool;
use crate::error::{EngineError, Result};
use crate::model::{
    Campaign, CampaignSnapshot, CycleOutcome, Enemy, EnemyKind, LogEvent, Participant,
    ParticipantOutcome, StatusEffect, WeeklySummary,
};
use crate::storage;

/// Every shadow stands with the same slim vitality; they are speed
/// bumps, not walls.
const SHADOW_VITALITY: i64 = 10;

struct PlannedOutcome {
    participant_id: Uuid,
    name: String,
    outcome: CycleOutcome,
    status_before: StatusEffect,
    status_after: StatusEffect,
    new_level: u32,
    leveled_up: bool,
}

struct WeekPlan {
    outcomes: Vec<PlannedOutcome>,
    required: u32,
    delivered: u32,
    shadows: Vec<Enemy>,
    removals: Vec<Uuid>,
    boss_shift: Option<(Uuid, i64)>,
    boss_cut: Option<(Uuid, i64)>,
}

impl Engine {
    /// Closes out the current cycle: judges every hero against the
    /// weekly goal, settles the shadow ledger, and opens the next cycle.
    pub fn resolve_week(&self, campaign_id: Uuid) -> Result<(CampaignSnapshot, WeeklySummary)> {
        let mut conn = self.connect(campaign_id)?;

        let campaign = storage::campaign::load(&conn)?;
        if campaign.completed {
            return Err(EngineError::CampaignComplete);
        }

        let roster = storage::participant::load_all(&conn)?;
        let enemies = storage::enemy::load_all(&conn)?;
        let plan = plan_week(&campaign, &roster, &enemies, self.content.as_ref());

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for outcome in &plan.outcomes {
            storage::participant::resolve_cycle(
                &tx,
                outcome.participant_id,
                outcome.new_level,
                outcome.status_after,
            )?;
        }
        for shadow in &plan.shadows {
            storage::enemy::insert(&tx, shadow)?;
        }
        if let Some((boss_id, new_ordering)) = plan.boss_shift {
            storage::enemy::set_ordering(&tx, boss_id, new_ordering)?;
        }
        for enemy_id in &plan.removals {
            storage::enemy::remove(&tx, *enemy_id)?;
        }
        if let Some((boss_id, cut)) = plan.boss_cut {
            storage::enemy::cut_vitality(&tx, boss_id, cut)?;
        }
        storage::campaign::advance_cycle(&tx)?;
        tx.commit()?;

        for outcome in &plan.outcomes {
            if outcome.status_before != outcome.status_after {
                self.narrate(
                    &conn,
                    &LogEvent::StatusChanged {
                        participant_id: outcome.participant_id,
                        participant_name: outcome.name.clone(),
                        from: outcome.status_before,
                        to: outcome.status_after,
                    },
                );
            }
            if outcome.leveled_up {
                self.narrate(
                    &conn,
                    &LogEvent::LevelUp {
                        participant_id: outcome.participant_id,
                        participant_name: outcome.name.clone(),
                        level: outcome.new_level,
                    },
                );
            }
        }
        let shadows_created = u32::try_from(plan.shadows.len()).unwrap_or(u32::MAX);
        let shadows_removed = u32::try_from(plan.removals.len()).unwrap_or(u32::MAX);
        let boss_vitality_cut = plan.boss_cut.map_or(0, |(_, cut)| cut);
        if shadows_created > 0 {
            self.narrate(
                &conn,
                &LogEvent::ShadowsGrew {
                    count: shadows_created,
                },
            );
        }
        if shadows_removed > 0 || boss_vitality_cut > 0 {
            self.narrate(
                &conn,
                &LogEvent::ShadowsReceded {
                    removed: shadows_removed,
                    boss_vitality_cut,
                },
            );
        }
        self.narrate(
            &conn,
            &LogEvent::CycleStarted {
                cycle: campaign.current_cycle + 1,
            },
        );

        tracing::info!(
            "resolved cycle {} of campaign {}: {} of {} oaths delivered",
            campaign.current_cycle,
            campaign.name,
            plan.delivered,
            plan.required
        );

        let summary = WeeklySummary {
            cycle: campaign.current_cycle,
            outcomes: plan
                .outcomes
                .iter()
                .map(|o| ParticipantOutcome {
                    participant_id: o.participant_id,
                    name: o.name.clone(),
                    outcome: o.outcome,
                    status_before: o.status_before,
                    status_after: o.status_after,
                    leveled_up: o.leveled_up,
                })
                .collect(),
            required: plan.required,
            delivered: plan.delivered,
            shadows_created,
            shadows_removed,
            boss_vitality_cut,
        };
        let snapshot = self.snapshot_and_broadcast(campaign_id, &conn)?;
        Ok((snapshot, summary))
    }
}

/// Computes everything the week changes without touching storage.
fn plan_week(
    campaign: &Campaign,
    roster: &[Participant],
    enemies: &[Enemy],
    content: &dyn ContentPool,
) -> WeekPlan {
    let goal = campaign.config.oaths_per_cycle;

    let mut outcomes = Vec::with_capacity(roster.len());
    for hero in roster {
        let outcome = match hero.cycle_oaths.cmp(&goal) {
            Ordering::Greater => CycleOutcome::Exceeded,
            Ordering::Equal => CycleOutcome::Met,
            Ordering::Less => CycleOutcome::Missed,
        };
        let leveled_up = outcome != CycleOutcome::Missed;
        outcomes.push(PlannedOutcome {
            participant_id: hero.id,
            name: hero.name.clone(),
            outcome,
            status_before: hero.status,
            status_after: next_status(hero.status, outcome),
            new_level: if leveled_up { hero.level + 1 } else { hero.level },
            leveled_up,
        });
    }

    let required = goal.saturating_mul(u32::try_from(roster.len()).unwrap_or(u32::MAX));
    let delivered = roster
        .iter()
        .fold(0u32, |acc, h| acc.saturating_add(h.cycle_oaths));

    let live_boss = enemies
        .iter()
        .find(|e| e.kind == EnemyKind::Boss && !e.defeated);
    let max_ordering = enemies.iter().map(|e| e.ordering).max().unwrap_or(0);

    let mut shadows = Vec::new();
    let mut removals = Vec::new();
    let mut boss_shift = None;
    let mut boss_cut = None;

    if delivered < required {
        let growth = required - delivered;

        // Attribute each missing oath to a debtor, walking the roster in
        // enlistment order.
        let mut debtors: Vec<&Participant> = Vec::with_capacity(growth as usize);
        'attribution: for hero in roster {
            for _ in hero.cycle_oaths..goal {
                debtors.push(hero);
                if debtors.len() == growth as usize {
                    break 'attribution;
                }
            }
        }

        // Shadows take over the boss's slot and push it back, so the
        // party must face the debt before the finale.
        let base = live_boss.map_or(max_ordering + 1, |b| b.ordering);
        for (i, debtor) in debtors.iter().enumerate() {
            let template = content.shadow_template(Some(&debtor.name));
            shadows.push(Enemy {
                id: Uuid::new_v4(),
                name: template.name,
                description: template.description,
                vitality: SHADOW_VITALITY,
                max_vitality: SHADOW_VITALITY,
                loot_tier: 0,
                ordering: base + i64::try_from(i).unwrap_or(i64::MAX),
                defeated: false,
                loot_winner: None,
                kind: EnemyKind::Shadow,
                debtor: Some(debtor.id),
            });
        }
        boss_shift = live_boss.map(|b| (b.id, b.ordering + i64::from(growth)));
    } else if delivered > required {
        let mut shrink = delivered - required;

        let mut standing: Vec<&Enemy> = enemies
            .iter()
            .filter(|e| e.kind == EnemyKind::Shadow && !e.defeated)
            .collect();
        standing.sort_by_key(|e| e.ordering);

        // Each surplus oath banishes one shadow: the earner's own debt
        // first, then the oldest standing. Whatever finds no shadow is
        // carved out of the boss instead.
        let mut leftover: i64 = 0;
        'settlement: for hero in roster {
            for _ in goal..hero.cycle_oaths {
                if shrink == 0 {
                    break 'settlement;
                }
                shrink -= 1;
                let pick = standing
                    .iter()
                    .position(|s| s.debtor == Some(hero.id))
                    .or_else(|| if standing.is_empty() { None } else { Some(0) });
                match pick {
                    Some(idx) => removals.push(standing.remove(idx).id),
                    None => leftover += 1,
                }
            }
        }
        if leftover > 0 {
            // The store floors the boss at one point of vitality, so the
            // plan records the cut that lands, not the one attempted.
            boss_cut = live_boss.and_then(|b| {
                let cut = leftover.min(b.vitality - 1).max(0);
                (cut > 0).then_some((b.id, cut))
            });
        }
    }

    WeekPlan {
        outcomes,
        required,
        delivered,
        shadows,
        removals,
        boss_shift,
        boss_cut,
    }
}

/// The weekly status wheel. Blessing holds as long as the goal is met;
/// anything short of the goal lands on Cursed.
fn next_status(before: StatusEffect, outcome: CycleOutcome) -> StatusEffect {
    match outcome {
        CycleOutcome::Exceeded => match before {
            StatusEffect::Blessed => StatusEffect::Blessed,
            _ => StatusEffect::Inspired,
        },
        CycleOutcome::Met => match before {
            StatusEffect::Blessed => StatusEffect::Blessed,
            StatusEffect::Inspired => StatusEffect::Inspired,
            _ => StatusEffect::Sustained,
        },
        CycleOutcome::Missed => StatusEffect::Cursed,
    }
}
