//! Pool of live gateway links.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use lorawan_band::BandError;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::identifiers::{FrequencyPlan, GatewayId};
use super::link::{Link, LinkInfo, LinkState, UplinkStream};
use super::session::{GatewaySession, SessionError};
use crate::messages::{GatewayDown, GatewayUp};

/// Error type for pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The declared frequency plan does not resolve to a known band.
    #[error("Invalid frequency plan: {0}")]
    Band(#[from] BandError),

    /// No session is registered for the gateway.
    #[error("No active link for gateway {0}")]
    NoActiveLink(GatewayId),

    /// The gateway refused the downlink.
    #[error("Downlink to gateway {gateway_id} rejected: {reason}")]
    Rejected { gateway_id: GatewayId, reason: String },

    /// The session could not carry the downlink, e.g. because the connection
    /// is gone.
    #[error("Downlink to gateway {gateway_id} failed: {reason}")]
    Transport { gateway_id: GatewayId, reason: String },

    /// The gateway did not answer within the send timeout.
    #[error("Downlink to gateway {gateway_id} timed out after {timeout:?}")]
    Timeout {
        gateway_id: GatewayId,
        timeout: Duration,
    },
}

impl PoolError {
    /// Whether the same request may succeed later without being changed,
    /// e.g. once the gateway reconnects.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoActiveLink(_) | Self::Transport { .. } | Self::Timeout { .. }
        )
    }
}

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound of a single downlink delivery attempt.
    pub send_timeout: Duration,
    /// Uplink messages buffered per link before its receive task waits.
    pub uplink_buffer: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(1),
            uplink_buffer: 64,
        }
    }
}

type Registry = Arc<Mutex<HashMap<GatewayId, Arc<Link>>>>;

/// Registry of gateway links.
///
/// Holds at most one link per gateway; registering a session for a gateway
/// that already has one closes the previous link.
pub struct Pool {
    links: Registry,
    config: PoolConfig,
    next_generation: AtomicU64,
}

impl Pool {
    /// Create an empty pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            links: Arc::new(Mutex::new(HashMap::new())),
            config,
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Register a gateway session and start receiving from it.
    ///
    /// Must be called from within a Tokio runtime. The returned stream yields
    /// every message the session receives, in order, until the link closes.
    pub fn subscribe(
        &self,
        gateway_id: GatewayId,
        session: Arc<dyn GatewaySession>,
        frequency_plan: &FrequencyPlan,
    ) -> Result<UplinkStream, PoolError> {
        let band = frequency_plan.band()?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let link = Arc::new(Link::new(generation, gateway_id.clone(), band, session));

        let (tx, rx) = mpsc::channel(self.config.uplink_buffer.max(1));
        let stream = link.stream(rx);

        {
            let mut links = self.links.lock();
            // Readers must never see the replacement next to a live predecessor.
            if let Some(previous) = links.insert(gateway_id.clone(), Arc::clone(&link)) {
                previous.close();
                info!(
                    "[Gateway {}] Replaced link {} with link {}",
                    gateway_id, previous.generation, generation
                );
            }
        }

        info!(
            "[Gateway {}] Link {} active (band {})",
            gateway_id, generation, band.id
        );

        tokio::spawn(receive_loop(Arc::clone(&self.links), link, tx));
        Ok(stream)
    }

    /// Deliver a downlink to a gateway.
    ///
    /// Fails immediately with [`PoolError::NoActiveLink`] if the gateway has no
    /// link. Otherwise waits at most the configured send timeout for the
    /// session to accept or refuse the message. Only an explicit refusal by
    /// the gateway is reported as [`PoolError::Rejected`]. Never retries.
    pub async fn send(&self, gateway_id: &GatewayId, down: GatewayDown) -> Result<(), PoolError> {
        let link = self
            .links
            .lock()
            .get(gateway_id)
            .filter(|link| link.state() == LinkState::Active)
            .cloned()
            .ok_or_else(|| PoolError::NoActiveLink(gateway_id.clone()))?;

        let timeout = self.config.send_timeout;
        match tokio::time::timeout(timeout, link.session.send_downlink(down)).await {
            Ok(Ok(())) => {
                link.record_downlink();
                trace!("[Gateway {}] Downlink delivered", gateway_id);
                Ok(())
            }
            Ok(Err(SessionError::Rejected(reason))) => {
                debug!("[Gateway {}] Downlink rejected: {}", gateway_id, reason);
                Err(PoolError::Rejected {
                    gateway_id: gateway_id.clone(),
                    reason,
                })
            }
            Ok(Err(e)) => {
                warn!("[Gateway {}] Downlink failed: {}", gateway_id, e);
                Err(PoolError::Transport {
                    gateway_id: gateway_id.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!("[Gateway {}] Downlink timed out after {:?}", gateway_id, timeout);
                Err(PoolError::Timeout {
                    gateway_id: gateway_id.clone(),
                    timeout,
                })
            }
        }
    }

    /// Whether the gateway currently has an active link.
    pub fn is_connected(&self, gateway_id: &GatewayId) -> bool {
        self.links
            .lock()
            .get(gateway_id)
            .map_or(false, |link| link.state() == LinkState::Active)
    }

    /// Number of registered links.
    pub fn count(&self) -> usize {
        self.links.lock().len()
    }

    /// IDs of all registered gateways, sorted.
    pub fn gateways(&self) -> Vec<GatewayId> {
        let mut ids: Vec<_> = self.links.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn link_info(&self, gateway_id: &GatewayId) -> Option<LinkInfo> {
        self.links.lock().get(gateway_id).map(|link| link.info())
    }

    /// Close a gateway's link. Returns false if it had none.
    pub fn disconnect(&self, gateway_id: &GatewayId) -> bool {
        let removed = self.links.lock().remove(gateway_id);
        match removed {
            Some(link) => {
                info!("[Gateway {}] Disconnecting link {}", gateway_id, link.generation);
                link.close();
                true
            }
            None => false,
        }
    }

    /// Close every link.
    pub fn close_all(&self) {
        let links: Vec<_> = self.links.lock().drain().map(|(_, link)| link).collect();
        if !links.is_empty() {
            info!("Closing {} gateway link(s)", links.len());
        }
        for link in links {
            link.close();
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

/// Receive from the session until it fails or is cancelled, forwarding every
/// message to the link's stream.
async fn receive_loop(links: Registry, link: Arc<Link>, tx: mpsc::Sender<GatewayUp>) {
    let cancel = link.session.context();

    let reason = loop {
        let up = tokio::select! {
            _ = cancel.cancelled() => break "cancelled",
            result = link.session.recv_uplink() => match result {
                Ok(up) => up,
                Err(e) => {
                    warn!("[Gateway {}] Receive failed: {}", link.gateway_id, e);
                    break "receive failed";
                }
            },
        };

        link.record_uplink();
        trace!(
            "[Gateway {}] Received {} uplink(s), status: {}",
            link.gateway_id,
            up.uplink_messages.len(),
            up.gateway_status.is_some()
        );

        // A full buffer only holds up this link.
        tokio::select! {
            _ = cancel.cancelled() => break "cancelled",
            result = tx.send(up) => {
                if result.is_err() {
                    break "uplink stream dropped";
                }
            }
        }
    };

    link.mark_closed();
    let removed = remove_if_current(&links, &link);
    drop(tx);

    info!(
        "[Gateway {}] Link {} closed: {}{}",
        link.gateway_id,
        link.generation,
        reason,
        if removed { "" } else { " (already replaced)" }
    );
}

/// Remove the registry entry only if it still holds `link`.
fn remove_if_current(links: &Mutex<HashMap<GatewayId, Arc<Link>>>, link: &Link) -> bool {
    let mut links = links.lock();
    match links.get(&link.gateway_id) {
        Some(current) if current.generation == link.generation => {
            links.remove(&link.gateway_id);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use futures::FutureExt;

    use super::*;
    use crate::gateway::mock::{DownlinkBehavior, MockSession};
    use crate::gateway::SessionError;
    use crate::messages::{DownlinkMessage, GatewayStatus, RxSettings, TxSettings, UplinkMessage};

    fn gateway(id: &str) -> GatewayId {
        GatewayId::new(id).unwrap()
    }

    fn eu868() -> FrequencyPlan {
        FrequencyPlan::new("EU_863_870")
    }

    fn pool(send_timeout: Duration) -> Pool {
        Pool::new(PoolConfig {
            send_timeout,
            uplink_buffer: 4,
        })
    }

    fn status_up() -> GatewayUp {
        GatewayUp {
            uplink_messages: Vec::new(),
            gateway_status: Some(GatewayStatus {
                time: "2018-01-01T00:00:00Z".to_string(),
                metrics: BTreeMap::from([("rxok".to_string(), 1.0)]),
                versions: BTreeMap::new(),
            }),
        }
    }

    fn uplink(frequency: u32, payload: u8) -> GatewayUp {
        GatewayUp {
            uplink_messages: vec![UplinkMessage {
                raw_payload: vec![payload],
                settings: RxSettings {
                    frequency,
                    data_rate_index: 5,
                    timestamp: 1000,
                },
                rssi: -42.0,
                snr: 7.5,
            }],
            gateway_status: None,
        }
    }

    fn downlink() -> GatewayDown {
        GatewayDown::new(DownlinkMessage {
            raw_payload: vec![0x60, 0x01],
            settings: TxSettings {
                frequency: 868_100_000,
                data_rate_index: 5,
                tx_power: 14.0,
                timestamp: 1_001_000,
            },
        })
    }

    #[tokio::test]
    async fn test_g1_lifecycle() {
        let pool = pool(Duration::from_millis(100));
        let g1 = gateway("G1");
        let (session, uplinks) = MockSession::new();

        let mut stream = pool
            .subscribe(g1.clone(), session.clone(), &eu868())
            .unwrap();
        assert!(pool.is_connected(&g1));
        assert_eq!(stream.gateway_id(), &g1);

        uplinks.send(Ok(status_up())).unwrap();
        uplinks.send(Ok(uplink(868_100_000, 1))).unwrap();
        assert_eq!(stream.recv().await, Some(status_up()));
        assert_eq!(stream.recv().await, Some(uplink(868_100_000, 1)));

        pool.send(&g1, downlink()).await.unwrap();
        assert_eq!(session.sent(), vec![downlink()]);

        let info = pool.link_info(&g1).unwrap();
        assert_eq!(info.band_id, "EU_863_870");
        assert_eq!(info.uplinks, 2);
        assert_eq!(info.downlinks, 1);
        assert_eq!(info.state, LinkState::Active);

        session.context().cancel();
        assert_eq!(stream.recv().await, None);
        assert!(!pool.is_connected(&g1));
        assert!(matches!(
            pool.send(&g1, downlink()).await,
            Err(PoolError::NoActiveLink(id)) if id == g1
        ));
    }

    #[tokio::test]
    async fn test_replace_closes_previous_stream() {
        let pool = pool(Duration::from_millis(100));
        let g1 = gateway("G1");
        let (first, first_uplinks) = MockSession::new();
        let (second, second_uplinks) = MockSession::new();

        let mut old_stream = pool.subscribe(g1.clone(), first.clone(), &eu868()).unwrap();
        first_uplinks.send(Ok(uplink(868_100_000, 1))).unwrap();
        assert_eq!(old_stream.recv().await, Some(uplink(868_100_000, 1)));
        first_uplinks.send(Ok(uplink(868_100_000, 2))).unwrap();

        let mut new_stream = pool.subscribe(g1.clone(), second.clone(), &eu868()).unwrap();
        assert!(first.is_cancelled());
        // Already ended by the time the replacement is visible.
        assert_eq!(old_stream.recv().now_or_never(), Some(None));

        second_uplinks.send(Ok(uplink(868_300_000, 3))).unwrap();
        assert_eq!(new_stream.recv().await, Some(uplink(868_300_000, 3)));

        // The old receive task must not remove the replacement on its way out.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.count(), 1);
        assert!(pool.is_connected(&g1));
        pool.send(&g1, downlink()).await.unwrap();
        assert!(first.sent().is_empty());
        assert_eq!(second.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_link_fails_immediately() {
        let pool = pool(Duration::from_secs(3600));
        let err = tokio::time::timeout(
            Duration::from_millis(50),
            pool.send(&gateway("unknown"), downlink()),
        )
        .await
        .expect("send must not block")
        .unwrap_err();
        assert!(matches!(err, PoolError::NoActiveLink(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_times_out_after_configured_duration() {
        let timeout = Duration::from_millis(250);
        let pool = pool(timeout);
        let g1 = gateway("G1");
        let (session, _uplinks) = MockSession::new();
        session.set_behavior(DownlinkBehavior::Hang);
        let _stream = pool.subscribe(g1.clone(), session, &eu868()).unwrap();

        let start = tokio::time::Instant::now();
        let err = pool.send(&g1, downlink()).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, PoolError::Timeout { timeout: t, .. } if t == timeout));
        assert!(err.is_retryable());
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let pool = pool(Duration::from_secs(5));
        let g1 = gateway("G1");
        let (session, _uplinks) = MockSession::new();
        session.set_behavior(DownlinkBehavior::Reject);
        let _stream = pool.subscribe(g1.clone(), session, &eu868()).unwrap();

        let err = pool.send(&g1, downlink()).await.unwrap_err();
        match &err {
            PoolError::Rejected { gateway_id, reason } => {
                assert_eq!(gateway_id, &g1);
                assert!(reason.contains("Downlink refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_retryable());
        assert_eq!(pool.link_info(&g1).unwrap().downlinks, 0);
    }

    #[tokio::test]
    async fn test_send_on_dead_session_is_transport_failure() {
        let pool = pool(Duration::from_secs(5));
        let g1 = gateway("G1");
        let (session, _uplinks) = MockSession::new();
        session.set_behavior(DownlinkBehavior::Fail);
        let _stream = pool.subscribe(g1.clone(), session, &eu868()).unwrap();

        let err = pool.send(&g1, downlink()).await.unwrap_err();
        assert!(matches!(&err, PoolError::Transport { gateway_id, .. } if gateway_id == &g1));
        assert!(err.is_retryable());
        assert_eq!(pool.link_info(&g1).unwrap().downlinks, 0);
    }

    #[tokio::test]
    async fn test_hanging_send_does_not_block_uplinks() {
        let pool = Arc::new(pool(Duration::from_secs(3600)));
        let g1 = gateway("G1");
        let (session, uplinks) = MockSession::new();
        session.set_behavior(DownlinkBehavior::Hang);
        let mut stream = pool.subscribe(g1.clone(), session, &eu868()).unwrap();

        let sender = {
            let pool = Arc::clone(&pool);
            let g1 = g1.clone();
            tokio::spawn(async move { pool.send(&g1, downlink()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        for i in 0..8 {
            uplinks.send(Ok(uplink(868_100_000, i))).unwrap();
        }
        for i in 0..8 {
            assert_eq!(stream.recv().await, Some(uplink(868_100_000, i)));
        }
        assert!(!sender.is_finished());
        assert!(pool.is_connected(&g1));
        sender.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_in_flight_during_replace_finishes_on_old_link() {
        let pool = Arc::new(pool(Duration::from_secs(1)));
        let g1 = gateway("G1");
        let (first, _first_uplinks) = MockSession::new();
        let (second, _second_uplinks) = MockSession::new();
        first.set_behavior(DownlinkBehavior::Delay(Duration::from_millis(100)));
        let _old_stream = pool.subscribe(g1.clone(), first.clone(), &eu868()).unwrap();

        let sender = {
            let pool = Arc::clone(&pool);
            let g1 = g1.clone();
            tokio::spawn(async move { pool.send(&g1, downlink()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let _new_stream = pool.subscribe(g1.clone(), second.clone(), &eu868()).unwrap();
        assert!(first.is_cancelled());

        sender.await.unwrap().unwrap();
        assert_eq!(first.sent(), vec![downlink()]);
        assert!(second.sent().is_empty());

        // Nothing but this test holds the old session once the send is done.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(Arc::strong_count(&first), 1);
        assert!(pool.is_connected(&g1));
    }

    #[tokio::test]
    async fn test_receive_failure_closes_link_after_buffered_uplinks() {
        let pool = pool(Duration::from_millis(100));
        let g1 = gateway("G1");
        let (session, uplinks) = MockSession::new();
        let mut stream = pool.subscribe(g1.clone(), session.clone(), &eu868()).unwrap();

        uplinks.send(Ok(uplink(868_100_000, 1))).unwrap();
        uplinks
            .send(Err(SessionError::Io("Couldn't receive uplink".into())))
            .unwrap();

        assert_eq!(stream.recv().await, Some(uplink(868_100_000, 1)));
        assert_eq!(stream.recv().await, None);
        assert!(session.is_cancelled());
        assert!(!pool.is_connected(&g1));
        assert_eq!(pool.count(), 0);
    }

    #[tokio::test]
    async fn test_uplinks_keep_order_under_backpressure() {
        let pool = Pool::new(PoolConfig {
            send_timeout: Duration::from_millis(100),
            uplink_buffer: 1,
        });
        let (session, uplinks) = MockSession::new();
        let mut stream = pool.subscribe(gateway("G1"), session, &eu868()).unwrap();

        for i in 0..16 {
            uplinks.send(Ok(uplink(868_100_000, i))).unwrap();
        }
        for i in 0..16 {
            assert_eq!(stream.recv().await, Some(uplink(868_100_000, i)));
        }
    }

    #[tokio::test]
    async fn test_unknown_band_is_rejected() {
        let pool = Pool::default();
        let (session, _uplinks) = MockSession::new();
        let err = pool
            .subscribe(gateway("G1"), session, &FrequencyPlan::new("XX_000"))
            .unwrap_err();
        assert!(matches!(err, PoolError::Band(BandError::NotFound(_))));
        assert!(!err.is_retryable());
        assert_eq!(pool.count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_stream_closes_link() {
        let pool = pool(Duration::from_millis(100));
        let g1 = gateway("G1");
        let (session, uplinks) = MockSession::new();
        let stream = pool.subscribe(g1.clone(), session.clone(), &eu868()).unwrap();
        drop(stream);

        uplinks.send(Ok(uplink(868_100_000, 1))).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(session.is_cancelled());
        assert!(!pool.is_connected(&g1));
    }

    #[tokio::test]
    async fn test_disconnect_and_close_all() {
        let pool = pool(Duration::from_millis(100));
        let mut sessions = Vec::new();
        let mut streams = Vec::new();
        for id in ["G3", "G1", "G2"] {
            let (session, uplinks) = MockSession::new();
            streams.push(pool.subscribe(gateway(id), session.clone(), &eu868()).unwrap());
            sessions.push((session, uplinks));
        }
        assert_eq!(pool.gateways(), vec![gateway("G1"), gateway("G2"), gateway("G3")]);

        assert!(pool.disconnect(&gateway("G3")));
        assert!(!pool.disconnect(&gateway("G3")));
        assert!(sessions[0].0.is_cancelled());
        assert_eq!(streams[0].recv().await, None);
        assert_eq!(pool.count(), 2);

        pool.close_all();
        assert_eq!(pool.count(), 0);
        for stream in &mut streams {
            assert_eq!(stream.recv().await, None);
        }
        assert!(sessions.iter().all(|(session, _)| session.is_cancelled()));
    }
}
