//! Best-effort UDP notifications to the local orchestrator.

use digdar_protocol::Notification;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::debug;

/// Sends notification datagrams to a fixed local address.
///
/// Delivery is fire-and-forget: failures are logged at debug level and
/// otherwise ignored, because a lost datagram only costs the consumer
/// timeliness, never sweep integrity.
#[derive(Debug, Clone)]
pub struct Notifier {
    socket: Arc<UdpSocket>,
    dest: SocketAddr,
}

impl Notifier {
    /// Bind an ephemeral local socket for sending to `dest`.
    pub async fn bind(dest: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).await?;
        Ok(Self {
            socket: Arc::new(socket),
            dest,
        })
    }

    /// Announce that the listener is up.
    pub async fn capture_ready(&self) {
        self.send(Notification::capture_ready()).await;
    }

    /// Announce a sweep published at `path`.
    pub async fn sweep_ready(&self, path: &Path) {
        self.send(Notification::sweep_ready(path)).await;
    }

    async fn send(&self, msg: Notification) {
        let body = match msg.to_json() {
            Ok(body) => body,
            Err(err) => {
                debug!(%err, "failed to encode notification");
                return;
            }
        };
        if let Err(err) = self.socket.send_to(&body, self.dest).await {
            debug!(%err, dest = %self.dest, "notification datagram not delivered");
        }
    }
}
