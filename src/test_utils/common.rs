use crate::proto::Endpoint;
use crate::proto::IpSet;
use crate::proto::OpItem;
use crate::proto::Service;

pub(crate) fn service(
    namespace: &str,
    name: &str,
) -> Service {
    Service {
        namespace: namespace.to_string(),
        name: name.to_string(),
        r#type: "ClusterIP".to_string(),
        ..Default::default()
    }
}

pub(crate) fn endpoint(ip: &str) -> Endpoint {
    Endpoint {
        ips: Some(IpSet {
            v4: vec![ip.to_string()],
            v6: vec![],
        }),
        hostname: format!("host-{ip}"),
        local: false,
    }
}

/// `Set(Service, "<ns>/<name>")`
pub(crate) fn set_service(
    namespace: &str,
    name: &str,
) -> OpItem {
    OpItem::set_service(format!("{namespace}/{name}"), &service(namespace, name))
}

/// `Set(Endpoint, path)` for an endpoint with a single IPv4 address
pub(crate) fn set_endpoint(
    path: &str,
    ip: &str,
) -> OpItem {
    OpItem::set_endpoint(path, &endpoint(ip))
}

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}
