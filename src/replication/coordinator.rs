use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::replication::{QuorumPlan, ReplicaClient};
use crate::store::Store;

/// Final verdict for one coordinated write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Nodes that acknowledged before the coordinator stopped waiting,
    /// the leader's own apply included.
    pub acks: usize,
    pub required: usize,
    pub success: bool,
}

/// Owns the quorum write path: local apply, concurrent fan-out to every
/// follower, then a single wait on whichever of quorum or deadline comes
/// first.
///
/// Fan-out is send-all-wait-once, so a satisfied quorum costs the latency of
/// the slowest *required* follower, and an unhealthy follower can never push
/// a write past the configured timeout.
pub struct WriteCoordinator<C> {
    store: Store,
    replicas: Vec<C>,
    write_quorum: usize,
    write_timeout: Duration,
}

impl<C> WriteCoordinator<C>
where
    C: ReplicaClient,
{
    pub fn new(
        store: Store,
        replicas: Vec<C>,
        write_quorum: usize,
        write_timeout: Duration,
    ) -> Self {
        Self {
            store,
            replicas,
            write_quorum,
            write_timeout,
        }
    }

    pub fn plan(&self) -> QuorumPlan {
        QuorumPlan::new(self.write_quorum, self.replicas.len())
    }

    /// Coordinate one write.
    ///
    /// The local apply happens unconditionally before any fan-out, so the
    /// leader's own reads observe the value no matter what replication does
    /// afterwards. Replication tasks are deliberately detached: stragglers
    /// keep running past the returned verdict and their late acks change
    /// nothing.
    pub async fn write(&self, key: String, value: Vec<u8>) -> WriteOutcome {
        self.store.set(key.clone(), value.clone());

        let plan = self.plan();
        if plan.satisfied_locally() {
            return WriteOutcome {
                acks: 1,
                required: plan.required,
                success: true,
            };
        }

        // The leader's own apply is the first ack.
        let acks = Arc::new(AtomicUsize::new(1));
        let quorum_reached = Arc::new(Notify::new());

        for replica in &self.replicas {
            let replica = replica.clone();
            let key = key.clone();
            let value = value.clone();
            let acks = Arc::clone(&acks);
            let quorum_reached = Arc::clone(&quorum_reached);
            let required = plan.required;
            tokio::spawn(async move {
                if replica.replicate(&key, &value).await {
                    let total = acks.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(addr = replica.address(), total, "follower acknowledged write");
                    // Only the increment that first reaches the threshold
                    // fires the signal.
                    if total == required {
                        quorum_reached.notify_one();
                    }
                }
            });
        }

        // The single suspension point of the write path: quorum or deadline,
        // whichever comes first. `Notify` holds a permit if the quorum lands
        // before we start waiting.
        let _ = tokio::time::timeout(self.write_timeout, quorum_reached.notified()).await;

        let acks = acks.load(Ordering::SeqCst);
        let success = acks >= plan.required;
        if !success {
            warn!(
                acks,
                required = plan.required,
                "write did not reach quorum before the deadline"
            );
        }
        WriteOutcome {
            acks,
            required: plan.required,
            success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    /// Scripted replica: sleeps, then accepts or rejects. Counts calls so
    /// tests can assert that short-circuit paths issue none.
    #[derive(Clone)]
    struct ScriptedReplica {
        accept: bool,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedReplica {
        fn accepting() -> Self {
            Self::new(true, Duration::ZERO)
        }

        fn rejecting() -> Self {
            Self::new(false, Duration::ZERO)
        }

        fn new(accept: bool, delay: Duration) -> Self {
            Self {
                accept,
                delay,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[tonic::async_trait]
    impl ReplicaClient for ScriptedReplica {
        fn address(&self) -> &str {
            "scripted"
        }

        async fn replicate(&self, _key: &str, _value: &[u8]) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.accept
        }
    }

    fn coordinator(
        replicas: Vec<ScriptedReplica>,
        quorum: usize,
        timeout: Duration,
    ) -> (Store, WriteCoordinator<ScriptedReplica>) {
        let store = Store::new();
        let coordinator = WriteCoordinator::new(store.clone(), replicas, quorum, timeout);
        (store, coordinator)
    }

    #[tokio::test]
    async fn quorum_of_one_skips_the_network() {
        let replica = ScriptedReplica::accepting();
        let calls = Arc::clone(&replica.calls);
        let (store, coordinator) = coordinator(vec![replica], 1, Duration::from_secs(1));

        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert_eq!(
            outcome,
            WriteOutcome {
                acks: 1,
                required: 1,
                success: true
            }
        );
        assert_eq!(store.get("key1"), Some(b"value1".to_vec()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_followers_means_immediate_success() {
        let (_, coordinator) = coordinator(Vec::new(), 3, Duration::from_secs(1));
        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert_eq!(
            outcome,
            WriteOutcome {
                acks: 1,
                required: 1,
                success: true
            }
        );
    }

    #[tokio::test]
    async fn full_quorum_counts_every_ack() {
        let replicas = vec![ScriptedReplica::accepting(), ScriptedReplica::accepting()];
        let (_, coordinator) = coordinator(replicas, 3, Duration::from_secs(1));

        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert_eq!(
            outcome,
            WriteOutcome {
                acks: 3,
                required: 3,
                success: true
            }
        );
    }

    #[tokio::test]
    async fn rejections_produce_a_partial_verdict() {
        let replicas = vec![ScriptedReplica::accepting(), ScriptedReplica::rejecting()];
        let (store, coordinator) = coordinator(replicas, 3, Duration::from_millis(100));

        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert_eq!(
            outcome,
            WriteOutcome {
                acks: 2,
                required: 3,
                success: false
            }
        );
        // The failed write is still visible locally.
        assert_eq!(store.get("key1"), Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn quorum_returns_without_waiting_for_stragglers() {
        let fast = ScriptedReplica::accepting();
        let straggler = ScriptedReplica::new(true, Duration::from_millis(500));
        let (_, coordinator) = coordinator(vec![fast, straggler], 2, Duration::from_secs(2));

        let start = Instant::now();
        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert!(outcome.success);
        assert_eq!(outcome.acks, 2);
        assert!(
            start.elapsed() < Duration::from_millis(400),
            "write waited on a straggler beyond the quorum"
        );
    }

    #[tokio::test]
    async fn deadline_bounds_the_wait() {
        let slow = ScriptedReplica::new(true, Duration::from_secs(5));
        let (_, coordinator) = coordinator(vec![slow.clone(), slow], 3, Duration::from_millis(100));

        let start = Instant::now();
        let outcome = coordinator.write("key1".to_owned(), b"value1".to_vec()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.acks, 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
