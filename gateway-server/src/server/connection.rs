//! One gateway TCP connection.
//!
//! Newline delimited JSON: the first line from the gateway is a [`Hello`],
//! every further line a [`GatewayUp`]. Lines to the gateway are
//! [`GatewayDown`] messages.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;

use crate::claims::{Claims, ClaimsError, EntityIdentifiers, Right};
use crate::config::GatewayEntry;
use crate::gateway::{FrequencyPlan, GatewayId, GatewaySession, Pool, PoolError, SessionError};
use crate::messages::{GatewayDown, GatewayUp};

/// Longest accepted line, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Time a new connection has to present its hello.
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

type Lines = Framed<TcpStream, LinesCodec>;

/// First message of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub gateway_id: GatewayId,
    /// Band the gateway believes it operates in; must match its configuration
    /// when given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_plan: Option<String>,
    pub token: String,
}

/// Error type for a single connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line error: {0}")]
    Lines(#[from] LinesCodecError),

    #[error("Malformed hello: {0}")]
    MalformedHello(#[from] serde_json::Error),

    #[error("Connection closed before hello")]
    NoHello,

    #[error("No hello within {0:?}")]
    HelloTimeout(Duration),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Claims(#[from] ClaimsError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Gateways allowed to connect, keyed by ID.
///
/// Stands in for an identity server: a matching token yields gateway claims.
#[derive(Debug, Default)]
pub struct TokenTable {
    entries: HashMap<GatewayId, GatewayEntry>,
}

impl TokenTable {
    pub fn new(entries: impl IntoIterator<Item = GatewayEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Claims and configured frequency plan for a hello.
    pub fn authenticate(&self, hello: &Hello) -> Result<(Claims, FrequencyPlan), ConnectionError> {
        let entry = self
            .entries
            .get(&hello.gateway_id)
            .ok_or_else(|| ConnectionError::Unauthorized(format!("unknown gateway {}", hello.gateway_id)))?;
        if entry.token != hello.token {
            return Err(ConnectionError::Unauthorized(format!(
                "invalid token for gateway {}",
                hello.gateway_id
            )));
        }
        if let Some(declared) = &hello.frequency_plan {
            if declared != &entry.frequency_plan {
                return Err(ConnectionError::Unauthorized(format!(
                    "gateway {} declared {} but is configured for {}",
                    hello.gateway_id, declared, entry.frequency_plan
                )));
            }
        }

        let claims = Claims::new(
            EntityIdentifiers::Gateway(entry.id.clone()),
            "token",
            vec![Right::GatewayInfo, Right::GatewayLink],
        );
        Ok((claims, FrequencyPlan::new(&entry.frequency_plan)))
    }
}

/// A gateway session over a line framed TCP stream.
pub struct TcpSession {
    addr: SocketAddr,
    reader: Mutex<SplitStream<Lines>>,
    writer: Mutex<SplitSink<Lines, String>>,
    cancel: CancellationToken,
}

impl TcpSession {
    fn new(addr: SocketAddr, lines: Lines) -> Self {
        let (writer, reader) = lines.split();
        Self {
            addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            cancel: CancellationToken::new(),
        }
    }
}

impl GatewaySession for TcpSession {
    fn recv_uplink(&self) -> BoxFuture<'_, Result<GatewayUp, SessionError>> {
        Box::pin(async move {
            let mut reader = self.reader.lock().await;
            loop {
                let line = match reader.next().await {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => return Err(SessionError::Io(e.to_string())),
                    None => return Err(SessionError::Closed),
                };
                match serde_json::from_str(&line) {
                    Ok(up) => return Ok(up),
                    Err(e) => warn!("[{}] Dropping malformed uplink: {}", self.addr, e),
                }
            }
        })
    }

    fn send_downlink(&self, down: GatewayDown) -> BoxFuture<'_, Result<(), SessionError>> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return Err(SessionError::Closed);
            }
            let line = serde_json::to_string(&down).map_err(|e| SessionError::Io(e.to_string()))?;
            let mut writer = self.writer.lock().await;
            if self.cancel.is_cancelled() {
                return Err(SessionError::Closed);
            }

            // A write abandoned part way, e.g. on a send timeout, leaves the frame
            // in the write buffer. Close the session so it is never flushed.
            let guard = self.cancel.clone().drop_guard();
            let result = writer.send(line).await;
            guard.disarm();
            result.map_err(|e| SessionError::Io(e.to_string()))
        })
    }

    fn context(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Serve one gateway connection until its link closes.
pub(crate) async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    connection_id: u64,
    pool: Arc<Pool>,
    tokens: Arc<TokenTable>,
) -> Result<(), ConnectionError> {
    socket.set_nodelay(true)?;
    let mut lines = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    let line = tokio::time::timeout(HELLO_TIMEOUT, lines.next())
        .await
        .map_err(|_| ConnectionError::HelloTimeout(HELLO_TIMEOUT))?
        .ok_or(ConnectionError::NoHello)??;
    let hello: Hello = serde_json::from_str(&line)?;

    let (claims, frequency_plan) = tokens.authenticate(&hello)?;
    claims.require_gateway(&hello.gateway_id, &[Right::GatewayLink])?;

    info!(
        "[Connection {}] Gateway {} connected from {} ({})",
        connection_id, hello.gateway_id, addr, frequency_plan.band_id
    );

    let session = Arc::new(TcpSession::new(addr, lines));
    let mut uplinks = pool.subscribe(hello.gateway_id.clone(), session, &frequency_plan)?;

    // The MAC layer is not part of this server; uplinks are only logged.
    while let Some(up) = uplinks.recv().await {
        for message in &up.uplink_messages {
            debug!(
                "[Connection {}] Uplink from {}: {} bytes at {} Hz DR{} (RSSI {} dBm, SNR {} dB)",
                connection_id,
                hello.gateway_id,
                message.raw_payload.len(),
                message.settings.frequency,
                message.settings.data_rate_index,
                message.rssi,
                message.snr
            );
        }
        if let Some(status) = &up.gateway_status {
            debug!(
                "[Connection {}] Status from {} at {}",
                connection_id, hello.gateway_id, status.time
            );
        }
    }

    Ok(())
}
