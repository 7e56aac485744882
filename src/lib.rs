pub mod client;
pub mod config;
pub mod error;
pub mod latency;
pub mod node;
pub mod replication;
pub mod store;

pub use config::NodeConfig;
pub use error::Error;
pub use node::Node;
pub use replication::Role;
pub use store::Store;

pub type Result<T> = std::result::Result<T, Error>;

pub mod proto {
    tonic::include_proto!("qkv");
}
