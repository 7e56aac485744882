use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use qkv::{Node, NodeConfig, Role};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(long, default_value = "127.0.0.1:5000", env = "QKV_ADDR")]
    addr: SocketAddr,

    /// Role this node plays in the cluster.
    #[clap(long, default_value = Role::Leader, env = "ROLE")]
    role: Role,

    /// Comma-separated follower endpoints,
    /// e.g. "http://f1:5000,http://f2:5000".
    #[clap(long, value_delimiter = ',', env = "FOLLOWERS")]
    followers: Vec<String>,

    /// Nodes, the leader included, that must confirm a write.
    #[clap(long, default_value = "3", env = "WRITE_QUORUM")]
    write_quorum: usize,

    /// Lower bound of the simulated network lag, in milliseconds.
    #[clap(long, default_value = "0.1", env = "MIN_DELAY_MS")]
    min_delay_ms: f64,

    /// Upper bound of the simulated network lag, in milliseconds.
    #[clap(long, default_value = "10.0", env = "MAX_DELAY_MS")]
    max_delay_ms: f64,

    /// Max time to wait for quorum before reporting a partial write, in seconds.
    #[clap(long, default_value = "1.0", env = "WRITE_TIMEOUT_SEC")]
    write_timeout_sec: f64,

    #[clap(long, default_value = "info", env = "QKV_LOG")]
    log_level: tracing_subscriber::filter::LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut app = App::parse();
    tracing_subscriber::fmt()
        .with_max_level(app.log_level)
        .init();

    // An empty FOLLOWERS env var must mean "no followers", not one blank one.
    app.followers.retain(|f| !f.trim().is_empty());

    let config = NodeConfig {
        role: app.role,
        addr: app.addr,
        followers: app.followers,
        write_quorum: app.write_quorum,
        min_delay: Duration::from_secs_f64(app.min_delay_ms / 1000.0),
        max_delay: Duration::from_secs_f64(app.max_delay_ms / 1000.0),
        write_timeout: Duration::from_secs_f64(app.write_timeout_sec),
    };
    Node::new(config).serve().await
}
