//! The broadcast collaborator: pushing refreshed snapshots to observers.

use uuid::Uuid;

use crate::model::CampaignSnapshot;

/// Push channel for refreshed campaign snapshots.
///
/// Best-effort: the signature is infallible and the engine never waits on
/// delivery. Clients that miss a push reconcile with a full re-fetch.
pub trait Broadcast: Send + Sync {
    fn publish(&self, campaign_id: Uuid, snapshot: &CampaignSnapshot);
}

/// Discards every snapshot. The default when no transport is wired up.
pub struct NullBroadcast;

impl Broadcast for NullBroadcast {
    fn publish(&self, _campaign_id: Uuid, _snapshot: &CampaignSnapshot) {}
}

/// Records every publish for assertions. Clones share the same record.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordingBroadcast {
    published: std::sync::Arc<std::sync::Mutex<Vec<(Uuid, CampaignSnapshot)>>>,
}

#[cfg(test)]
impl RecordingBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(Uuid, CampaignSnapshot)> {
        self.published.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Broadcast for RecordingBroadcast {
    fn publish(&self, campaign_id: Uuid, snapshot: &CampaignSnapshot) {
        self.published
            .lock()
            .unwrap()
            .push((campaign_id, snapshot.clone()));
    }
}
