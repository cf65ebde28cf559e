//! Engine errors and the coarse taxonomy callers map to transport codes.

use uuid::Uuid;

use crate::storage::StorageError;

/// Errors surfaced by engine operations.
///
/// All are terminal per call: the engine never retries. Anything not
/// caller-correctable rides in as [`EngineError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("campaign not found: {0}")]
    CampaignNotFound(Uuid),

    #[error("participant not found: {0}")]
    ParticipantNotFound(Uuid),

    #[error("no enemy at ordering key {0}")]
    EnemyNotFound(i64),

    #[error("no live target to strike")]
    NoLiveTarget,

    #[error("campaign is already complete")]
    CampaignComplete,

    #[error("no action to undo")]
    NothingToUndo,

    #[error("the most recent action belongs to another participant")]
    NotYourAction,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Raw `rusqlite` failures from engine-owned transactions surface as
/// storage errors, one `?` hop away from [`EngineError::Storage`].
impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

/// Taxonomy code for a failure, for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Forbidden,
    Validation,
    Internal,
}

impl EngineError {
    /// The taxonomy code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CampaignNotFound(_)
            | Self::ParticipantNotFound(_)
            | Self::EnemyNotFound(_)
            | Self::NothingToUndo
            | Self::Storage(StorageError::CampaignNotFound(_)) => ErrorKind::NotFound,
            Self::NoLiveTarget | Self::CampaignComplete => ErrorKind::InvalidState,
            Self::NotYourAction => ErrorKind::Forbidden,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = core::result::Result<T, EngineError>;
