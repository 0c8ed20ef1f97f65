//! TCP listener for accepting gateway connections.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::gateway::Pool;
use crate::server::connection::{handle_connection, TokenTable};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

/// Accepts gateway connections and registers them with the pool.
pub struct Server {
    listener: TcpListener,
    pool: Arc<Pool>,
    tokens: Arc<TokenTable>,
}

impl Server {
    /// Bind the listening socket.
    pub async fn bind(
        config: &ServerConfig,
        pool: Arc<Pool>,
        tokens: Arc<TokenTable>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        if tokens.is_empty() {
            warn!("No gateways configured; every connection will be refused");
        }
        Ok(Self {
            listener,
            pool,
            tokens,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Accept connections forever.
    pub async fn run(&self) -> std::io::Result<()> {
        let mut connection_count = 0u64;

        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    connection_count += 1;
                    let connection_id = connection_count;

                    info!("[Connection {}] New connection from {}", connection_id, addr);

                    let pool = Arc::clone(&self.pool);
                    let tokens = Arc::clone(&self.tokens);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, addr, connection_id, pool, tokens).await {
                            error!("[Connection {}] Connection error: {}", connection_id, e);
                        }
                        info!("[Connection {}] Connection closed", connection_id);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
