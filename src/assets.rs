//! Concurrent asset resolution.
//!
//! Resolves a set of asset names (profile image files) to download URLs under
//! a shared parent path. All-or-nothing: the UI that asks for these needs
//! every one of them to render, so the first failure fails the aggregate and
//! aborts the remaining in-flight fetches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::store::BlobStore;

pub struct AssetFetcher {
    blobs: Arc<dyn BlobStore>,
    /// Shared parent address every named asset lives under.
    parent: String,
}

impl AssetFetcher {
    pub fn new(blobs: Arc<dyn BlobStore>, parent: impl Into<String>) -> Self {
        Self {
            blobs,
            parent: parent.into(),
        }
    }

    /// Resolve every name to its download URL, one concurrent task per name.
    ///
    /// Succeeds only if all names resolve; on the first failure the siblings
    /// are aborted and a [`SyncError::PartialFetch`] naming the failed asset
    /// is returned. Dropping the returned future cancels all in-flight work.
    pub async fn resolve_all(&self, names: HashSet<String>) -> SyncResult<HashMap<String, String>> {
        let mut tasks: JoinSet<Result<(String, String), (String, String)>> = JoinSet::new();
        for name in names {
            let blobs = Arc::clone(&self.blobs);
            let path = format!("{}/{}", self.parent, name);
            tasks.spawn(async move {
                match blobs.download_url(&path).await {
                    Ok(url) => Ok((name, url)),
                    Err(err) => Err((name, err.to_string())),
                }
            });
        }

        let mut resolved = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((name, url))) => {
                    resolved.insert(name, url);
                }
                Ok(Err((name, reason))) => {
                    tasks.abort_all();
                    debug!(asset = %name, %reason, "asset fan-out aborted");
                    return Err(SyncError::PartialFetch { name, reason });
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(SyncError::Unclassified(format!(
                        "asset task failed: {join_err}"
                    )));
                }
            }
        }
        Ok(resolved)
    }
}
