//! End-to-end tests over real sockets: a leader and its followers run
//! in-process on localhost ports and are driven through the gRPC surface.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use qkv::proto::kv_client::KvClient;
use qkv::proto::{DumpRequest, GetRequest, PutRequest};
use qkv::{Node, NodeConfig, Role};
use tonic::transport::Channel;

fn node_config(role: Role, port: u16, followers: Vec<String>, quorum: usize) -> NodeConfig {
    NodeConfig {
        role,
        addr: SocketAddr::from(([127, 0, 0, 1], port)),
        followers,
        write_quorum: quorum,
        // Deterministic timing for tests.
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        write_timeout: Duration::from_millis(500),
    }
}

fn uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

fn spawn_node(config: NodeConfig) {
    tokio::spawn(Node::new(config).serve());
}

/// Retries until the node accepts connections; panics after five seconds.
async fn connect(port: u16) -> KvClient<Channel> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match KvClient::connect(uri(port)).await {
            Ok(client) => return client,
            Err(_) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => panic!("node on port {port} never came up: {e}"),
        }
    }
}

// Each test gets its own port block so they can run in parallel.

#[tokio::test]
async fn write_reaches_full_quorum() {
    spawn_node(node_config(Role::Follower, 46011, Vec::new(), 3));
    spawn_node(node_config(Role::Follower, 46012, Vec::new(), 3));
    spawn_node(node_config(
        Role::Leader,
        46010,
        vec![uri(46011), uri(46012)],
        3,
    ));

    let mut leader = connect(46010).await;
    let mut followers = [connect(46011).await, connect(46012).await];

    let resp = leader
        .put(PutRequest {
            key: "key1".to_owned(),
            value: Some(b"value1".to_vec()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.acks, 3);
    assert_eq!(resp.required, 3);
    assert!(resp.success);
    assert_eq!(resp.role, "leader");

    // Success at full quorum means both followers applied before acking.
    for follower in &mut followers {
        let read = follower
            .get(GetRequest {
                key: "key1".to_owned(),
            })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(read.value, b"value1".to_vec(), "follower lagging the leader");
    }

    let leader_dump = leader.dump(DumpRequest {}).await.unwrap().into_inner();
    for follower in &mut followers {
        let dump = follower.dump(DumpRequest {}).await.unwrap().into_inner();
        assert_eq!(dump.entries, leader_dump.entries);
    }
}

#[tokio::test]
async fn missing_follower_yields_partial_write() {
    // Only one of the two configured followers is running.
    spawn_node(node_config(Role::Follower, 46021, Vec::new(), 3));
    spawn_node(node_config(
        Role::Leader,
        46020,
        vec![uri(46021), uri(46022)],
        3,
    ));

    let mut leader = connect(46020).await;
    let resp = leader
        .put(PutRequest {
            key: "key1".to_owned(),
            value: Some(b"value1".to_vec()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.acks, 2);
    assert_eq!(resp.required, 3);
    assert!(!resp.success);

    // The partial write is still readable on the leader.
    let read = leader
        .get(GetRequest {
            key: "key1".to_owned(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(read.value, b"value1".to_vec());
}

#[tokio::test]
async fn quorum_of_one_returns_immediately() {
    // Neither follower is running; a quorum of one must not care.
    spawn_node(node_config(
        Role::Leader,
        46030,
        vec![uri(46031), uri(46032)],
        1,
    ));

    let mut leader = connect(46030).await;
    let start = Instant::now();
    let resp = leader
        .put(PutRequest {
            key: "key1".to_owned(),
            value: Some(b"value1".to_vec()),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.acks, 1);
    assert_eq!(resp.required, 1);
    assert!(resp.success);
    assert!(
        start.elapsed() < Duration::from_millis(250),
        "a satisfied-locally write waited on the network"
    );
}

#[tokio::test]
async fn follower_rejects_writes_over_the_wire() {
    spawn_node(node_config(Role::Follower, 46040, Vec::new(), 3));

    let mut follower = connect(46040).await;
    let status = follower
        .put(PutRequest {
            key: "key1".to_owned(),
            value: Some(b"value1".to_vec()),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::FailedPrecondition);
}
