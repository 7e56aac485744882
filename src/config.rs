use std::net::SocketAddr;
use std::time::Duration;

use crate::replication::Role;

/// Process-wide configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub role: Role,

    /// Address this node listens on.
    pub addr: SocketAddr,

    /// Follower endpoints the leader replicates to,
    /// e.g. `http://127.0.0.1:5001`. Ignored on followers.
    pub followers: Vec<String>,

    /// How many nodes, the leader included, must acknowledge a write before
    /// it is reported as successful. Clamped per write to `1..=total_nodes`.
    pub write_quorum: usize,

    /// Bounds for the simulated network lag ahead of each replication call.
    pub min_delay: Duration,
    pub max_delay: Duration,

    /// How long a write waits for quorum, and how long each replication
    /// attempt may run, before giving up.
    pub write_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: Role::Leader,
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            followers: Vec::new(),
            write_quorum: 3,
            min_delay: Duration::from_micros(100),
            max_delay: Duration::from_millis(10),
            write_timeout: Duration::from_secs(1),
        }
    }
}
