use thiserror::Error;

use crate::store::StoreError;

pub type SyncResult<T> = core::result::Result<T, SyncError>;

/// Uniform failure vocabulary surfaced to the application layer.
///
/// `Store` is a pre-classification carrier: every store failure is run through
/// [`SyncError::classify`] exactly once, at the facade, where the connectivity
/// oracle decides between `Connectivity` and `Unclassified`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store call failed while the device was offline. Reads get a retry
    /// affordance; writes are reported as queued for delivery.
    #[error("offline: {0}")]
    Connectivity(String),
    /// An explicitly addressed document is missing. An absent Focus pointer is
    /// *not* reported through this variant; it is a valid state.
    #[error("document not found: {0}")]
    NotFound(String),
    /// Record resolution was asked to go through the Focus pointer and none is set.
    #[error("no explicit todo reference and no focus is set")]
    NoFocus,
    /// At least one named asset failed to resolve; no partial mapping is surfaced.
    #[error("asset '{name}' failed to resolve: {reason}")]
    PartialFetch { name: String, reason: String },
    /// The caller has no resolvable user id. Never retried.
    #[error("no resolvable user identity")]
    Identity,
    /// The backend was reachable but momentarily unavailable; worth retrying.
    #[error("transient store failure: {0}")]
    Transient(String),
    /// A document failed strict decoding. The serde error names the offending field.
    #[error("decode failed for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Unclassified(String),
}

/// How the UI should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient or connectivity-related; retrying (or waiting for delivery) is sane.
    Retryable,
    /// Data or logic error; escalate, never auto-retry.
    Fatal,
}

impl SyncError {
    /// Resolve the pre-classification `Store` carrier against a point-in-time
    /// connectivity snapshot. Every other variant passes through unchanged.
    pub fn classify(self, online: bool) -> Self {
        match self {
            Self::Store(err) => {
                if !online {
                    Self::Connectivity(err.to_string())
                } else {
                    match err {
                        StoreError::NotFound(path) => Self::NotFound(path),
                        StoreError::Unavailable(msg) => Self::Transient(msg),
                        StoreError::Backend(msg) => Self::Unclassified(msg),
                    }
                }
            }
            other => other,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Connectivity(_) | Self::Transient(_) => ErrorClass::Retryable,
            _ => ErrorClass::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}
