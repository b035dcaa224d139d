use crate::core::actuation::AxisCall;
use crate::domain::ports::Actuator;
use crate::utils::error::{BridgeError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

/// HTTP client for the axis server's `/api/devices` endpoints.
#[derive(Debug, Clone)]
pub struct ActuationClient {
    server: String,
    client: Client,
}

impl ActuationClient {
    /// Every request gives up after `timeout`, so a hung axis server frees
    /// the lane for the next call.
    pub fn new(server: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(server, client))
    }

    pub fn with_client(server: impl Into<String>, client: Client) -> Self {
        let server = server.into().trim_end_matches('/').to_string();
        Self { server, client }
    }

    pub fn url_for(&self, call: &AxisCall) -> String {
        format!("{}{}", self.server, call.path())
    }
}

#[async_trait::async_trait]
impl Actuator for ActuationClient {
    async fn execute(&self, call: &AxisCall) -> Result<()> {
        let url = self.url_for(call);
        tracing::debug!("PUT {} {:?}", url, call.body);

        let mut request = self.client.put(&url);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!("Axis server response status: {}", response.status());

        if !response.status().is_success() {
            return Err(BridgeError::ActuationRejected {
                axis_id: call.axis_id.clone(),
                action: call.action.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Sender half of the actuation work queue. Cloned into every session.
#[derive(Debug, Clone)]
pub struct ActuationQueue {
    sender: mpsc::Sender<AxisCall>,
}

impl ActuationQueue {
    /// Bounded queue and its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AxisCall>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Never waits: a full or closed queue drops the call with a warning.
    /// Returns how many calls were accepted.
    pub fn submit(&self, calls: Vec<AxisCall>) -> usize {
        let mut accepted = 0;
        for call in calls {
            match self.sender.try_send(call) {
                Ok(()) => accepted += 1,
                Err(e) => {
                    let call = match &e {
                        mpsc::error::TrySendError::Full(call) => call,
                        mpsc::error::TrySendError::Closed(call) => call,
                    };
                    tracing::warn!(
                        "Dropping {} for axis {}: actuation queue unavailable ({})",
                        call.action,
                        call.axis_id,
                        e
                    );
                }
            }
        }
        accepted
    }
}

/// Spawns the actuation dispatcher.
///
/// Each axis id gets its own lane drained by its own task: calls for one axis
/// run one at a time in submission order, and a slow call on one axis never
/// holds back the other. Each call is attempted once; failures are only logged.
/// Aborting the returned handle stops every lane.
pub fn spawn_actuation_worker<A>(
    actuator: Arc<A>,
    capacity: usize,
) -> (ActuationQueue, JoinHandle<()>)
where
    A: Actuator + ?Sized + 'static,
{
    let (queue, mut receiver) = ActuationQueue::channel(capacity);

    let handle = tokio::spawn(async move {
        let mut lanes: HashMap<String, ActuationQueue> = HashMap::new();
        let mut workers = JoinSet::new();

        while let Some(call) = receiver.recv().await {
            let lane = lanes.entry(call.axis_id.clone()).or_insert_with(|| {
                let (lane, lane_receiver) = ActuationQueue::channel(capacity);
                workers.spawn(drain_lane(Arc::clone(&actuator), lane_receiver));
                lane
            });
            lane.submit(vec![call]);
        }

        // 關閉各軸佇列，等剩下的呼叫跑完
        lanes.clear();
        while workers.join_next().await.is_some() {}
        tracing::debug!("Actuation queue closed");
    });

    (queue, handle)
}

async fn drain_lane<A>(actuator: Arc<A>, mut receiver: mpsc::Receiver<AxisCall>)
where
    A: Actuator + ?Sized,
{
    while let Some(call) = receiver.recv().await {
        if let Err(e) = actuator.execute(&call).await {
            tracing::warn!(
                "Actuation {} on axis {} failed: {}",
                call.action,
                call.axis_id,
                e
            );
        }
    }
}
