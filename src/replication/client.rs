use std::sync::Arc;
use std::time::Duration;

use tonic::transport::Endpoint;
use tracing::debug;

use crate::latency::Latency;
use crate::proto::kv_client::KvClient;
use crate::proto::ReplicateRequest;

/// One replication attempt to one follower.
///
/// Implementations report only accept/reject; a failed or timed-out attempt
/// is absorbed here and shows up solely as a missing ack.
#[tonic::async_trait]
pub trait ReplicaClient: Clone + Send + Sync + 'static {
    /// The follower endpoint this client pushes to, for logging.
    fn address(&self) -> &str;

    /// Push one key-value pair to the follower. Returns `true` only if the
    /// follower explicitly accepted the write within the configured bound.
    async fn replicate(&self, key: &str, value: &[u8]) -> bool;
}

/// [`ReplicaClient`] over the gRPC surface of a remote node.
///
/// The connection is established per call so an unreachable follower costs at
/// most one timeout rather than failing client construction at startup.
#[derive(Clone)]
pub struct RemoteNodeClient {
    addr: String,
    timeout: Duration,
    latency: Arc<dyn Latency>,
}

impl RemoteNodeClient {
    pub fn new(addr: String, timeout: Duration, latency: Arc<dyn Latency>) -> Self {
        Self {
            addr,
            timeout,
            latency,
        }
    }

    async fn send(&self, key: &str, value: &[u8]) -> crate::Result<bool> {
        let channel = Endpoint::from_shared(self.addr.clone())?.connect().await?;
        let mut client = KvClient::new(channel);
        let response = client
            .replicate(ReplicateRequest {
                key: key.to_owned(),
                value: Some(value.to_vec()),
            })
            .await;
        // A non-success status is a rejection, not an error to surface.
        Ok(response.is_ok())
    }
}

#[tonic::async_trait]
impl ReplicaClient for RemoteNodeClient {
    fn address(&self) -> &str {
        &self.addr
    }

    async fn replicate(&self, key: &str, value: &[u8]) -> bool {
        // Simulated network lag, injected before the call is issued. The
        // timeout below bounds the call itself, not this sleep.
        tokio::time::sleep(self.latency.delay()).await;

        match tokio::time::timeout(self.timeout, self.send(key, value)).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "replication attempt failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "replication attempt timed out");
                false
            }
        }
    }
}
