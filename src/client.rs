use clap::Subcommand;

/// Actions that can be performed by the client against a running node.
#[derive(Debug, Subcommand)]
pub enum Action {
    /// Write a key-value pair through the leader's quorum path.
    Put { key: String, value: String },

    /// Read a value from the node's local store.
    Get { key: String },

    /// Fetch the node's entire store, for consistency checks.
    Dump,

    /// Report the node's role and liveness.
    Health,
}
