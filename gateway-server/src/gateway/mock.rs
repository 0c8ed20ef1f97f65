//! In-memory session used by the pool and transport tests.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::session::{GatewaySession, SessionError};
use crate::messages::{GatewayDown, GatewayUp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DownlinkBehavior {
    Accept,
    Reject,
    /// Never answer.
    Hang,
    /// Accept after a delay.
    Delay(Duration),
    /// Fail as a dead connection would.
    Fail,
}

pub(crate) struct MockSession {
    uplinks: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<GatewayUp, SessionError>>>,
    behavior: Mutex<DownlinkBehavior>,
    sent: Mutex<Vec<GatewayDown>>,
    cancel: CancellationToken,
}

impl MockSession {
    /// A session accepting downlinks, and the sender feeding its uplinks.
    pub(crate) fn new() -> (
        Arc<Self>,
        mpsc::UnboundedSender<Result<GatewayUp, SessionError>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            uplinks: tokio::sync::Mutex::new(rx),
            behavior: Mutex::new(DownlinkBehavior::Accept),
            sent: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        });
        (session, tx)
    }

    pub(crate) fn set_behavior(&self, behavior: DownlinkBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub(crate) fn sent(&self) -> Vec<GatewayDown> {
        self.sent.lock().clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl GatewaySession for MockSession {
    fn recv_uplink(&self) -> BoxFuture<'_, Result<GatewayUp, SessionError>> {
        Box::pin(async move {
            self.uplinks
                .lock()
                .await
                .recv()
                .await
                .unwrap_or(Err(SessionError::Closed))
        })
    }

    fn send_downlink(&self, down: GatewayDown) -> BoxFuture<'_, Result<(), SessionError>> {
        let behavior = *self.behavior.lock();
        Box::pin(async move {
            match behavior {
                DownlinkBehavior::Accept => {
                    self.sent.lock().push(down);
                    Ok(())
                }
                DownlinkBehavior::Reject => Err(SessionError::Rejected("Downlink refused".into())),
                DownlinkBehavior::Hang => futures::future::pending().await,
                DownlinkBehavior::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    self.sent.lock().push(down);
                    Ok(())
                }
                DownlinkBehavior::Fail => Err(SessionError::Closed),
            }
        })
    }

    fn context(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
