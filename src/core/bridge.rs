use crate::adapters::http::{spawn_actuation_worker, ActuationClient};
use crate::adapters::socketio::SocketIoConnector;
use crate::adapters::status;
use crate::app::server::{self, SessionContext};
use crate::core::feedback::{FeedbackChannel, FeedbackStats, ReconnectPolicy};
use crate::core::store::MountStore;
use crate::domain::model::AxisIds;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// Wires the listeners, the actuation worker and the feedback channel
/// around one shared store.
pub struct BridgeEngine {
    store: MountStore,
    axes: AxisIds,
    encoder_server: String,
    host: String,
    lx200_port: u16,
    stellarium_port: u16,
    status_port: u16,
    reconnect_policy: ReconnectPolicy,
    queue_capacity: usize,
    actuation_timeout: Duration,
}

/// Handles of a started bridge. Dropping it stops every task.
pub struct RunningBridge {
    pub lx200_addr: SocketAddr,
    pub stellarium_addr: SocketAddr,
    pub status_addr: SocketAddr,
    pub feedback_stats: Arc<FeedbackStats>,
    listeners: JoinSet<Result<()>>,
    background: Vec<JoinHandle<()>>,
}

impl BridgeEngine {
    pub fn new(config: &dyn ConfigProvider, store: MountStore) -> Self {
        Self {
            store,
            axes: config.axes(),
            encoder_server: config.encoder_server().to_string(),
            host: config.host().to_string(),
            lx200_port: config.lx200_port(),
            stellarium_port: config.stellarium_port(),
            status_port: config.status_port(),
            reconnect_policy: config.reconnect_policy(),
            queue_capacity: config.queue_capacity(),
            actuation_timeout: config.actuation_timeout(),
        }
    }

    /// Binds all three listeners first; any bind error aborts startup.
    pub async fn start(&self) -> Result<RunningBridge> {
        let lx200_listener = server::bind(&self.host, self.lx200_port).await?;
        let stellarium_listener = server::bind(&self.host, self.stellarium_port).await?;
        let status_listener = server::bind(&self.host, self.status_port).await?;

        let lx200_addr = lx200_listener.local_addr()?;
        let stellarium_addr = stellarium_listener.local_addr()?;
        let status_addr = status_listener.local_addr()?;

        let connector = SocketIoConnector::new(&self.encoder_server)?;
        let client = Arc::new(ActuationClient::new(
            self.encoder_server.clone(),
            self.actuation_timeout,
        )?);
        let (actuation, worker) = spawn_actuation_worker(client, self.queue_capacity);

        let feedback = FeedbackChannel::new(
            connector,
            self.store.clone(),
            self.axes.clone(),
            self.reconnect_policy,
        );
        let feedback_stats = feedback.stats();
        let feedback_task = tokio::spawn(feedback.run());

        let context = SessionContext::new(self.store.clone(), self.axes.clone(), actuation);
        let mut listeners = JoinSet::new();
        listeners.spawn(server::serve_lx200(lx200_listener, context.clone()));
        listeners.spawn(server::serve_stellarium(stellarium_listener, context));
        listeners.spawn(status::serve(status_listener, self.store.clone()));

        tracing::info!("🔭 Axis server: {}", self.encoder_server);
        tracing::info!(
            "🧭 Axes: RA -> {}, DEC -> {}",
            self.axes.ra,
            self.axes.dec
        );

        Ok(RunningBridge {
            lx200_addr,
            stellarium_addr,
            status_addr,
            feedback_stats,
            listeners,
            background: vec![worker, feedback_task],
        })
    }
}

impl RunningBridge {
    /// Resolves when any listener task ends, which only happens on error.
    pub async fn wait(&mut self) -> Result<()> {
        let finished = self.listeners.join_next().await;
        self.shutdown();

        match finished {
            Some(Ok(result)) => result,
            Some(Err(join_error)) => Err(std::io::Error::other(join_error).into()),
            None => Ok(()),
        }
    }

    pub fn shutdown(&mut self) {
        self.listeners.abort_all();
        for task in &self.background {
            task.abort();
        }
    }
}

impl Drop for RunningBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
