use crate::adapters::http::ActuationQueue;
use crate::app::sessions::{Lx200Session, StellariumSession};
use crate::core::store::MountStore;
use crate::domain::model::AxisIds;
use crate::utils::error::Result;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Everything a session needs, cloned once per connection.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub store: MountStore,
    pub axes: AxisIds,
    pub actuation: ActuationQueue,
}

impl SessionContext {
    pub fn new(store: MountStore, axes: AxisIds, actuation: ActuationQueue) -> Self {
        Self {
            store,
            axes,
            actuation,
        }
    }

    pub fn lx200_session(&self) -> Lx200Session {
        Lx200Session::new(self.store.clone(), self.axes.clone(), self.actuation.clone())
    }

    pub fn stellarium_session(&self) -> StellariumSession {
        StellariumSession::new(self.store.clone(), self.axes.clone(), self.actuation.clone())
    }
}

pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    Ok(listener)
}

/// Accepts LX200 clients forever, one task per connection.
pub async fn serve_lx200(listener: TcpListener, context: SessionContext) -> Result<()> {
    log_listening("LX200", &listener);
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("LX200 accept failed: {}", e);
                continue;
            }
        };

        let session = context.lx200_session();
        tokio::spawn(run_connection("LX200", peer, stream, |stream| {
            session.run(stream)
        }));
    }
}

/// Accepts Stellarium clients forever, one task per connection.
pub async fn serve_stellarium(listener: TcpListener, context: SessionContext) -> Result<()> {
    log_listening("Stellarium", &listener);
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Stellarium accept failed: {}", e);
                continue;
            }
        };

        let session = context.stellarium_session();
        tokio::spawn(run_connection("Stellarium", peer, stream, |stream| {
            session.run(stream)
        }));
    }
}

fn log_listening(protocol: &str, listener: &TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("{} server listening on {}", protocol, addr);
    }
}

async fn run_connection<F, Fut>(
    protocol: &'static str,
    peer: SocketAddr,
    stream: TcpStream,
    session: F,
) where
    F: FnOnce(TcpStream) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    tracing::info!("{} client connected: {}", protocol, peer);
    // 連線錯誤只影響這個 client
    match session(stream).await {
        Ok(()) => tracing::info!("{} client disconnected: {}", protocol, peer),
        Err(e) => tracing::warn!("{} client {} dropped: {}", protocol, peer, e),
    }
}
