//! Network build errors.

use crate::domain::{FeedId, StopKey};
use crate::feed::FeedError;
use crate::graph::street::StreetError;
use crate::network::InconsistentNetwork;
use crate::router::SearchError;

/// Error from building a network. Any of these aborts the build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A feed failed validation under the abort policy
    #[error("feed {feed} is invalid: {source}")]
    Feed {
        feed: FeedId,
        #[source]
        source: FeedError,
    },

    #[error("street network: {0}")]
    Street(#[from] StreetError),

    /// A transfer record names a stop the feed does not have
    #[error("feed {feed}: transfer refers to unknown stop {stop}")]
    UnknownTransferStop { feed: FeedId, stop: String },

    /// A recommended transfer was left without a duration
    #[error("transfer {from} -> {to} was not resolved")]
    UnresolvedTransfer { from: StopKey, to: StopKey },

    /// Walking cannot connect the two stations of a recommended transfer
    #[error("no walking path for transfer {from} -> {to}")]
    TransferUnreachable { from: StopKey, to: StopKey },

    #[error("transfer resolution task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Inconsistent(#[from] InconsistentNetwork),
}
