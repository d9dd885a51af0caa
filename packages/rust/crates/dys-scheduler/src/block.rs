//! Chain head polling.

use std::sync::Arc;
use std::time::Duration;

use dys_bridge::{RemoteBridge, SERVICE_GET_LATEST_BLOCK};
use dys_types::{BlockInfo, LatestBlockResponse};
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{SchedulerError, SchedulerResult};

/// Interval between latest-block polls.
pub const DEFAULT_BLOCK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Fetch the latest block header.
///
/// # Errors
/// Returns the classified bridge error, or [`SchedulerError::TransientFetch`] when the body
/// cannot be decoded.
pub async fn latest_block(bridge: &dyn RemoteBridge) -> SchedulerResult<Option<BlockInfo>> {
    let raw = bridge.dispatch(SERVICE_GET_LATEST_BLOCK, json!({})).await?;
    let response: LatestBlockResponse = serde_json::from_value(raw)
        .map_err(|e| SchedulerError::TransientFetch(format!("decode latest block: {e}")))?;
    Ok(response.into_block_info())
}

/// `target - current`; positive while the target lies in the future.
#[must_use]
pub fn block_diff(target: i64, current: i64) -> i64 {
    target.saturating_sub(current)
}

/// Background poller publishing the latest block on a watch channel.
pub struct BlockPoller {
    rx: watch::Receiver<Option<BlockInfo>>,
    task: JoinHandle<()>,
}

impl BlockPoller {
    /// Start polling immediately, then every `interval` after each completed poll.
    #[must_use]
    pub fn spawn(bridge: Arc<dyn RemoteBridge>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            loop {
                match latest_block(bridge.as_ref()).await {
                    Ok(Some(info)) => {
                        tx.send_if_modified(|current| {
                            if current.as_ref() == Some(&info) {
                                false
                            } else {
                                *current = Some(info);
                                true
                            }
                        });
                    }
                    Ok(None) => {
                        tracing::debug!(
                            event = "dys.block.empty",
                            "latest block response carried no header"
                        );
                    }
                    Err(error) => {
                        tracing::warn!(
                            event = "dys.block.poll_failed",
                            error = %error,
                            "latest block poll failed"
                        );
                    }
                }
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });
        Self { rx, task }
    }

    /// New receiver observing block updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<BlockInfo>> {
        self.rx.clone()
    }

    /// Last published block, if any poll succeeded.
    #[must_use]
    pub fn latest(&self) -> Option<BlockInfo> {
        self.rx.borrow().clone()
    }

    /// Stop polling.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for BlockPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
