//! Replication is achieved through a simplistic leader/follower model.
//!
//! The leader applies each write to its own [`crate::Store`] first, fans the
//! write out to every follower concurrently, and reports success once a
//! quorum of nodes has acknowledged it. Followers only ever apply writes
//! pushed to them; they never re-propagate.

mod client;
mod coordinator;

pub use client::{RemoteNodeClient, ReplicaClient};
pub use coordinator::{WriteCoordinator, WriteOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for clap::builder::OsStr {
    fn from(value: Role) -> Self {
        value.as_str().into()
    }
}

/// Replication plan derived per write from the configured quorum and the
/// follower list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumPlan {
    /// Leader plus every configured follower.
    pub total_nodes: usize,

    /// Acks needed for success, always within `1..=total_nodes`.
    pub required: usize,
}

impl QuorumPlan {
    pub fn new(configured_quorum: usize, follower_count: usize) -> Self {
        let total_nodes = 1 + follower_count;
        Self {
            total_nodes,
            required: configured_quorum.clamp(1, total_nodes),
        }
    }

    /// The leader's own local apply already satisfies this plan, so no
    /// network calls are needed.
    pub fn satisfied_locally(&self) -> bool {
        self.required <= 1
    }
}
