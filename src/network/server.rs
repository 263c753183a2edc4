//! UDP Game Server
//!
//! Receives one datagram at a time, hands it to the dispatcher and flushes
//! the resulting outbox. Runs until the gold is gone or the server is
//! interrupted.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{info, warn, debug, instrument};

use crate::game::state::Session;
use crate::network::broadcast::broadcast_quit;
use crate::network::dispatcher::{handle_message, Flow};
use crate::network::outbox::Outbox;
use crate::network::protocol::QUIT_SHUTDOWN;

/// Largest payload a UDP datagram can carry.
pub const MAX_DATAGRAM: usize = 65507;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address. Port 0 picks an ephemeral port.
    pub bind_addr: SocketAddr,
    /// Receive buffer size.
    pub max_datagram: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            max_datagram: MAX_DATAGRAM,
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        /// Requested address
        addr: SocketAddr,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Socket failed while running.
    #[error("Socket error: {0}")]
    Socket(#[from] std::io::Error),
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// All gold collected and the summary sent.
    Completed,
    /// Stopped by a signal or [`GameServer::shutdown`].
    Interrupted,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Bound socket.
    socket: UdpSocket,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Bind the socket.
    pub async fn bind(config: ServerConfig) -> Result<Self, GameServerError> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| GameServerError::BindFailed { addr: config.bind_addr, source })?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self { config, socket, shutdown_tx })
    }

    /// Address actually bound, including the chosen port.
    pub fn local_addr(&self) -> Result<SocketAddr, GameServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve a session until it ends.
    ///
    /// The session is torn down before returning.
    #[instrument(skip(self, session))]
    pub async fn run(&self, session: &mut Session) -> Result<GameOutcome, GameServerError> {
        info!("Game server listening on {}", self.local_addr()?);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut buf = vec![0u8; self.config.max_datagram];
        let mut outbox = Outbox::new();

        let outcome = loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    let (len, from) = match result {
                        Ok(received) => received,
                        Err(e) if is_transient(&e) => {
                            warn!(error = %e, "Receive failed, continuing");
                            continue;
                        }
                        Err(e) => {
                            session.teardown();
                            return Err(e.into());
                        }
                    };
                    let text = String::from_utf8_lossy(&buf[..len]);
                    debug!(%from, message = %text, "Received");

                    let flow = handle_message(session, from, &text, &mut outbox);
                    self.flush(&mut outbox).await;

                    if flow == Flow::GameOver {
                        info!("All gold collected");
                        break GameOutcome::Completed;
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Interrupt received");
                    break GameOutcome::Interrupted;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break GameOutcome::Interrupted;
                }
            }
        };

        if outcome == GameOutcome::Interrupted {
            broadcast_quit(session, QUIT_SHUTDOWN, &mut outbox);
            self.flush(&mut outbox).await;
        }
        session.teardown();

        Ok(outcome)
    }

    /// Send everything queued. Failures are logged, never retried.
    async fn flush(&self, outbox: &mut Outbox) {
        for envelope in outbox.drain() {
            let payload = envelope.message.to_string();
            if let Err(e) = self.socket.send_to(payload.as_bytes(), envelope.to).await {
                warn!(to = %envelope.to, kind = envelope.message.kind(), "Send failed: {}", e);
            }
        }
    }

    /// Stop the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Receive errors that say nothing about the socket itself.
///
/// A datagram sent to a client that has gone away can surface as a reset or
/// refusal on the next receive.
fn is_transient(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionRefused
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::config::GameConfig;
    use crate::core::grid::GridPoint;
    use crate::core::rng::SessionRng;
    use crate::game::gold::GoldPile;
    use crate::game::map::GameMap;
    use crate::game::state::SessionPhase;

    const CORRIDOR: &str = "+---+\n|...|\n+---+\n";

    async fn start(session: Session) -> (Arc<GameServer>, SocketAddr, tokio::task::JoinHandle<(Result<GameOutcome, GameServerError>, Session)>) {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = Arc::new(GameServer::bind(config).await.unwrap());
        let addr = server.local_addr().unwrap();

        let runner = server.clone();
        let handle = tokio::spawn(async move {
            let mut session = session;
            let outcome = runner.run(&mut session).await;
            (outcome, session)
        });
        (server, addr, handle)
    }

    async fn client() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    async fn recv(socket: &UdpSocket) -> String {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for datagram")
            .unwrap();
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }

    fn corridor_session() -> Session {
        let map = GameMap::parse(CORRIDOR).unwrap();
        let piles = vec![GoldPile::new(GridPoint::new(2, 1), 9)];
        Session::with_gold(map, GameConfig::default(), SessionRng::new(77), piles).unwrap()
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 0);
        assert_eq!(config.max_datagram, 65507);
    }

    #[test]
    fn test_receive_errors_from_departed_clients_are_transient() {
        use std::io::{Error, ErrorKind};
        assert!(is_transient(&Error::from(ErrorKind::ConnectionReset)));
        assert!(is_transient(&Error::from(ErrorKind::ConnectionRefused)));
        assert!(!is_transient(&Error::from(ErrorKind::PermissionDenied)));
        assert!(!is_transient(&Error::other("socket closed")));
    }

    #[tokio::test]
    async fn test_spectate_round_trip() {
        let (server, addr, handle) = start(corridor_session()).await;
        let viewer = client().await;

        viewer.send_to(b"SPECTATE", addr).await.unwrap();
        assert_eq!(recv(&viewer).await, "GRID 3 5");
        assert_eq!(recv(&viewer).await, "DISPLAY\n+---+\n|.*.|\n+---+\n");
        assert_eq!(recv(&viewer).await, "GOLD 0 0 9");

        server.shutdown();
        let (outcome, session) = handle.await.unwrap();
        assert_eq!(outcome.unwrap(), GameOutcome::Interrupted);
        assert_eq!(recv(&viewer).await, "QUIT Server shutting down");
        assert_eq!(session.phase(), SessionPhase::Closed);
    }

    #[tokio::test]
    async fn test_game_runs_to_completion() {
        let (_server, addr, handle) = start(corridor_session()).await;
        let player = client().await;

        player.send_to(b"PLAY solo", addr).await.unwrap();
        assert_eq!(recv(&player).await, "OK A");
        assert_eq!(recv(&player).await, "GRID 3 5");

        // Spawned at one end of the corridor; one of the slides reaches the gold
        player.send_to(b"KEY L", addr).await.unwrap();
        player.send_to(b"KEY H", addr).await.unwrap();

        let (outcome, session) = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(outcome.unwrap(), GameOutcome::Completed);
        assert_eq!(session.gold_remaining(), 0);
        assert_eq!(session.players()[0].purse, 9);

        let mut last = String::new();
        while !last.starts_with("GAMEOVER") {
            last = recv(&player).await;
        }
        assert_eq!(last, "GAMEOVER\n1. A solo 9\n");
    }
}
