//! A registered gateway session and its uplink stream.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Local};
use futures::Stream;
use lorawan_band::Band;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::identifiers::GatewayId;
use super::session::GatewaySession;
use crate::messages::GatewayUp;

/// Liveness of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Active,
    Closed,
}

/// Point-in-time view of a link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    pub gateway_id: GatewayId,
    pub band_id: &'static str,
    /// RFC 3339, local time.
    pub connected_at: String,
    pub connected_seconds: i64,
    pub uplinks: u64,
    pub downlinks: u64,
    pub state: LinkState,
}

pub(crate) struct Link {
    /// Distinguishes successive links registered under the same gateway ID.
    pub(crate) generation: u64,
    pub(crate) gateway_id: GatewayId,
    pub(crate) band: &'static Band,
    pub(crate) session: Arc<dyn GatewaySession>,
    /// Cancelled when the pool drops the link; the uplink stream ends without
    /// draining what is still buffered.
    discard: CancellationToken,
    connected_at: DateTime<Local>,
    uplinks: AtomicU64,
    downlinks: AtomicU64,
    closed: AtomicBool,
}

impl Link {
    pub(crate) fn new(
        generation: u64,
        gateway_id: GatewayId,
        band: &'static Band,
        session: Arc<dyn GatewaySession>,
    ) -> Self {
        Self {
            generation,
            gateway_id,
            band,
            session,
            discard: CancellationToken::new(),
            connected_at: Local::now(),
            uplinks: AtomicU64::new(0),
            downlinks: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> LinkState {
        if self.closed.load(Ordering::Acquire) {
            LinkState::Closed
        } else {
            LinkState::Active
        }
    }

    /// Mark the link closed and cancel the session. Returns false if it was
    /// already closed.
    pub(crate) fn mark_closed(&self) -> bool {
        let was_closed = self.closed.swap(true, Ordering::AcqRel);
        self.session.context().cancel();
        !was_closed
    }

    /// Close the link on behalf of the pool: the subscriber stream ends at once.
    pub(crate) fn close(&self) -> bool {
        self.discard.cancel();
        self.mark_closed()
    }

    pub(crate) fn record_uplink(&self) {
        self.uplinks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_downlink(&self) {
        self.downlinks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn info(&self) -> LinkInfo {
        LinkInfo {
            gateway_id: self.gateway_id.clone(),
            band_id: self.band.id,
            connected_at: self.connected_at.to_rfc3339(),
            connected_seconds: (Local::now() - self.connected_at).num_seconds(),
            uplinks: self.uplinks.load(Ordering::Relaxed),
            downlinks: self.downlinks.load(Ordering::Relaxed),
            state: self.state(),
        }
    }

    pub(crate) fn stream(&self, rx: mpsc::Receiver<GatewayUp>) -> UplinkStream {
        UplinkStream {
            gateway_id: self.gateway_id.clone(),
            rx,
            discard: self.discard.clone(),
        }
    }
}

/// Messages received from one gateway, in arrival order.
///
/// Ends when the link closes. If the link is replaced or disconnected by the
/// pool, frames still buffered are dropped.
#[derive(Debug)]
pub struct UplinkStream {
    gateway_id: GatewayId,
    rx: mpsc::Receiver<GatewayUp>,
    discard: CancellationToken,
}

impl UplinkStream {
    pub fn gateway_id(&self) -> &GatewayId {
        &self.gateway_id
    }

    /// Next message, or `None` once the link is closed.
    pub async fn recv(&mut self) -> Option<GatewayUp> {
        futures::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<GatewayUp>> {
        if self.discard.is_cancelled() {
            self.rx.close();
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Stream for UplinkStream {
    type Item = GatewayUp;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}
