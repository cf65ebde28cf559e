//! Undo: reverses the most recent strike in a campaign.

use rusqlite::TransactionBehavior;
use uuid::Uuid;

use super::Engine;
use crate::error::{EngineError, Result};
use crate::model::{CampaignSnapshot, LogEvent};
use crate::storage::{self, StorageError};

impl Engine {
    /// Takes back the most recent strike, campaign-wide.
    ///
    /// Only the hero who made it may undo it. Counters and vitality are
    /// restored exactly; records that outlived the strike, like the
    /// highest die seen or a claimed weapon, deliberately stand.
    pub fn undo_action(&self, campaign_id: Uuid, participant_id: Uuid) -> Result<CampaignSnapshot> {
        let mut conn = self.connect(campaign_id)?;

        let Some(entry) = storage::log::last_attack(&conn)? else {
            return Err(EngineError::NothingToUndo);
        };
        let LogEvent::Attack {
            participant_id: striker,
            enemy_id,
            raw,
            damage,
            hit,
            killing_blow,
            ..
        } = entry.event
        else {
            return Err(EngineError::Storage(StorageError::Corrupt(
                "attack entry carries a non-attack payload".into(),
            )));
        };
        if striker != participant_id {
            return Err(EngineError::NotYourAction);
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        storage::participant::revert_strike(&tx, participant_id, raw, raw == 20)?;

        if hit {
            // The enemy may be gone by now, banished by a later weekly
            // settlement; its half of the revert then no-ops.
            if let Some(enemy) = storage::enemy::find(&tx, enemy_id)? {
                storage::enemy::restore_vitality(&tx, enemy_id, damage)?;
                if killing_blow && enemy.defeated {
                    storage::enemy::revive(&tx, enemy_id)?;
                    storage::campaign::set_cursor(&tx, enemy.ordering)?;
                    storage::campaign::set_completed(&tx, false)?;
                    for later in storage::log::entries_after(&tx, entry.seq)? {
                        if is_kill_fallout(&later.event, enemy_id) {
                            storage::log::delete(&tx, later.seq)?;
                        }
                    }
                }
            }
        }

        storage::log::delete(&tx, entry.seq)?;
        tx.commit()?;

        tracing::info!("undid the last strike in campaign {campaign_id}");
        self.snapshot_and_broadcast(campaign_id, &conn)
    }
}

/// Narrative entries that only exist because of the undone killing blow.
fn is_kill_fallout(event: &LogEvent, enemy_id: Uuid) -> bool {
    match event {
        LogEvent::EnemyVanquished { enemy_id: id, .. }
        | LogEvent::LootClaimed { enemy_id: id, .. } => *id == enemy_id,
        LogEvent::GateReached { .. } | LogEvent::CampaignCompleted => true,
        _ => false,
    }
}
