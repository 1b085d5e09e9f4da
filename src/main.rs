use localnet_client::proto::WatchReq;
use localnet_client::ClientConfig;
use localnet_client::EndpointsClient;
use localnet_client::Result;
use localnet_client::ServiceEndpoints;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    // Initializing Logs
    init_observability();

    let config = ClientConfig::load(None)?;
    info!("watching {}", config.target);

    let mut client = EndpointsClient::new(config)?;

    // Listen on Shutdown Signal
    install_signal_bridge(&client);

    let req = WatchReq::for_node(std::env::var("NODE_NAME").unwrap_or_default());
    let mut rounds = 0u64;
    loop {
        let (items, canceled) = client.next(&req).await;
        if canceled {
            break;
        }

        rounds += 1;
        println!("--- round {} ({} services)", rounds, items.len());
        for item in &items {
            print_service(item);
        }
    }

    info!("canceled after {} rounds", rounds);
    Ok(())
}

fn print_service(item: &ServiceEndpoints) {
    let service = &item.service;
    println!("{}/{} ({})", service.namespace, service.name, service.r#type);

    for endpoint in &item.endpoints {
        let (v4, v6) = endpoint
            .ips
            .as_ref()
            .map(|ips| (ips.v4.join(","), ips.v6.join(",")))
            .unwrap_or_default();
        println!(
            "  - {} v4=[{}] v6=[{}]{}",
            endpoint.hostname,
            v4,
            v6,
            if endpoint.local { " local" } else { "" }
        );
    }
}

#[cfg(unix)]
fn install_signal_bridge(client: &EndpointsClient) {
    if let Err(e) = client.cancel_on_signals() {
        error!("failed to install signal handlers: {:?}", e);
    }
}

#[cfg(not(unix))]
fn install_signal_bridge(_client: &EndpointsClient) {}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();
}
