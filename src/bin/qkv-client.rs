use clap::Parser;
use qkv::client::Action;
use qkv::proto::kv_client::KvClient;
use qkv::proto::{DumpRequest, GetRequest, HealthRequest, PutRequest};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(name = "addr", global = true, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    #[clap(subcommand)]
    subcmd: Action,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = App::parse();
    let mut client = KvClient::connect(cli.server).await?;

    match cli.subcmd {
        Action::Put { key, value } => {
            let resp = client
                .put(PutRequest {
                    key,
                    value: Some(value.into_bytes()),
                })
                .await?
                .into_inner();
            println!(
                "acks={} required={} success={}",
                resp.acks, resp.required, resp.success
            );
            if !resp.success {
                // Partial write: applied on the leader, quorum not met.
                std::process::exit(1);
            }
        }
        Action::Get { key } => match client.get(GetRequest { key }).await {
            Ok(resp) => println!("{}", String::from_utf8_lossy(&resp.into_inner().value)),
            Err(status) if status.code() == tonic::Code::NotFound => {
                eprintln!("Key not found");
                std::process::exit(1);
            }
            Err(status) => return Err(status.into()),
        },
        Action::Dump => {
            let entries = client.dump(DumpRequest {}).await?.into_inner().entries;
            for (key, value) in entries {
                println!("{key}={}", String::from_utf8_lossy(&value));
            }
        }
        Action::Health => {
            let resp = client.health(HealthRequest {}).await?.into_inner();
            println!("role={} status={}", resp.role, resp.status);
        }
    }

    Ok(())
}
