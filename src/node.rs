use std::net::SocketAddr;
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::error::Error;
use crate::latency::{Latency, UniformLatency};
use crate::proto::kv_server::{Kv, KvServer};
use crate::proto::{
    DumpRequest, DumpResponse, GetRequest, GetResponse, HealthRequest, HealthResponse, PutRequest,
    PutResponse, ReplicateRequest, ReplicateResponse,
};
use crate::replication::{RemoteNodeClient, ReplicaClient, Role, WriteCoordinator};
use crate::store::Store;

/// A single cluster member: role, its local [`Store`], and, on the leader,
/// the [`WriteCoordinator`] for the quorum write path.
///
/// All role checks live here; the store and the coordinator below are
/// role-agnostic.
#[derive(Clone)]
pub struct Node<C = RemoteNodeClient> {
    role: Role,
    addr: SocketAddr,
    store: Store,
    coordinator: Arc<WriteCoordinator<C>>,
}

impl Node<RemoteNodeClient> {
    pub fn new(config: NodeConfig) -> Self {
        let latency: Arc<dyn Latency> =
            Arc::new(UniformLatency::new(config.min_delay, config.max_delay));
        let replicas = config
            .followers
            .iter()
            .map(|addr| {
                RemoteNodeClient::new(addr.clone(), config.write_timeout, Arc::clone(&latency))
            })
            .collect();
        Self::with_replicas(config, replicas)
    }
}

impl<C> Node<C>
where
    C: ReplicaClient,
{
    /// Construct a node over pre-built replica clients. Tests use this to
    /// substitute scripted replicas for real network peers.
    pub fn with_replicas(config: NodeConfig, replicas: Vec<C>) -> Self {
        let store = Store::new();
        let coordinator = WriteCoordinator::new(
            store.clone(),
            replicas,
            config.write_quorum,
            config.write_timeout,
        );
        Self {
            role: config.role,
            addr: config.addr,
            store,
            coordinator: Arc::new(coordinator),
        }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        info!("listening on {}", self.addr);
        info!(
            role = %self.role,
            "qkv-server version: {}",
            env!("CARGO_PKG_VERSION"),
        );
        tonic::transport::Server::builder()
            .add_service(KvServer::new(self.clone()))
            .serve(self.addr)
            .await?;
        Ok(())
    }
}

#[tonic::async_trait]
impl<C> Kv for Node<C>
where
    C: ReplicaClient,
{
    async fn health(
        &self,
        _req: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        Ok(Response::new(HealthResponse {
            role: self.role.to_string(),
            status: "ok".to_string(),
        }))
    }

    async fn get(&self, req: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let req = req.into_inner();
        match self.store.get(&req.key) {
            Some(value) => Ok(Response::new(GetResponse {
                key: req.key,
                value,
            })),
            None => Err(Error::KeyNotFound.into()),
        }
    }

    async fn put(&self, req: Request<PutRequest>) -> Result<Response<PutResponse>, Status> {
        if !self.role.is_leader() {
            return Err(Error::NotLeader { role: self.role }.into());
        }
        let req = req.into_inner();
        if req.key.is_empty() {
            return Err(Error::EmptyKey.into());
        }
        let Some(value) = req.value else {
            return Err(Error::MissingValue.into());
        };

        debug!(key = %req.key, "coordinating write");
        let outcome = self.coordinator.write(req.key.clone(), value.clone()).await;

        // Quorum-not-met is a normal typed outcome, not an RPC error: the
        // caller still gets the partial ack count.
        Ok(Response::new(PutResponse {
            key: req.key,
            value,
            acks: outcome.acks as u32,
            required: outcome.required as u32,
            success: outcome.success,
            role: self.role.to_string(),
        }))
    }

    async fn replicate(
        &self,
        req: Request<ReplicateRequest>,
    ) -> Result<Response<ReplicateResponse>, Status> {
        let req = req.into_inner();
        if req.key.is_empty() {
            return Err(Error::EmptyKey.into());
        }
        let Some(value) = req.value else {
            return Err(Error::MissingValue.into());
        };

        // Single-hop by construction: a follower applies locally and never
        // re-propagates.
        debug!(key = %req.key, "applying replicated write");
        self.store.set(req.key, value);
        Ok(Response::new(ReplicateResponse {
            status: "stored".to_string(),
            role: self.role.to_string(),
        }))
    }

    async fn dump(&self, _req: Request<DumpRequest>) -> Result<Response<DumpResponse>, Status> {
        Ok(Response::new(DumpResponse {
            entries: self.store.snapshot(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader() -> Node {
        // No followers configured, so puts stay entirely local.
        Node::new(NodeConfig::default())
    }

    fn follower() -> Node {
        Node::new(NodeConfig {
            role: Role::Follower,
            ..NodeConfig::default()
        })
    }

    fn put_request(key: &str, value: Option<&[u8]>) -> Request<PutRequest> {
        Request::new(PutRequest {
            key: key.to_owned(),
            value: value.map(|v| v.to_vec()),
        })
    }

    #[tokio::test]
    async fn follower_rejects_client_writes() {
        let status = follower()
            .put(put_request("key1", Some(b"value1")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn put_requires_a_key_and_a_value() {
        let node = leader();
        let status = node.put(put_request("", Some(b"value1"))).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status = node.put(put_request("key1", None)).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn leader_only_put_succeeds_immediately() {
        let node = leader();
        let resp = node
            .put(put_request("key1", Some(b"value1")))
            .await
            .unwrap()
            .into_inner();
        assert!(resp.success);
        assert_eq!(resp.acks, 1);
        assert_eq!(resp.required, 1);
        assert_eq!(resp.role, "leader");

        let read = node
            .get(Request::new(GetRequest {
                key: "key1".to_owned(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(read.value, b"value1".to_vec());
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let status = leader()
            .get(Request::new(GetRequest {
                key: "missing".to_owned(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn replicate_applies_on_any_role() {
        for node in [leader(), follower()] {
            let resp = node
                .replicate(Request::new(ReplicateRequest {
                    key: "key1".to_owned(),
                    value: Some(b"value1".to_vec()),
                }))
                .await
                .unwrap()
                .into_inner();
            assert_eq!(resp.status, "stored");

            let dump = node
                .dump(Request::new(DumpRequest {}))
                .await
                .unwrap()
                .into_inner();
            assert_eq!(dump.entries.get("key1"), Some(&b"value1".to_vec()));
        }
    }

    #[tokio::test]
    async fn replicate_rejects_missing_fields() {
        let node = follower();
        let status = node
            .replicate(Request::new(ReplicateRequest {
                key: "key1".to_owned(),
                value: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn health_reports_role() {
        let resp = follower()
            .health(Request::new(HealthRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(resp.role, "follower");
        assert_eq!(resp.status, "ok");
    }
}
