use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::async_trait;
use tonic::codec::CompressionEncoding;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;
use tonic::Streaming;
use tracing::debug;
use tracing::info;

use super::Connector;
use super::WatchStream;
use crate::constants::MULTI_TARGET_PREFIX;
use crate::proto::endpoints_client::EndpointsClient;
use crate::proto::OpItem;
use crate::proto::WatchReq;
use crate::ClientConfig;
use crate::NetworkError;
use crate::Result;

/// Outbound watch requests buffered before the server drains them
const OUTBOUND_BUFFER: usize = 16;

/// Dials the watch API over gRPC.
///
/// A single-address target is dialed eagerly so that dial failures surface
/// from [`Connector::connect`]. A `multi:///` target becomes a channel
/// balanced over every listed address.
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    target: String,
    endpoints: Vec<Endpoint>,
    max_msg_size: usize,
    enable_compression: bool,
}

impl GrpcConnector {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let tls = config.tls.client_tls_config()?;
        let endpoints = parse_target(&config.target, tls.is_some())?
            .into_iter()
            .map(|uri| build_endpoint(uri, config, tls.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            target: config.target.clone(),
            endpoints,
            max_msg_size: config.max_msg_size,
            enable_compression: config.enable_compression,
        })
    }

    async fn channel(&self) -> Result<Channel> {
        match self.endpoints.as_slice() {
            [single] => Ok(single.connect().await?),
            many => Ok(Channel::balance_list(many.iter().cloned())),
        }
    }
}

#[async_trait]
impl Connector for GrpcConnector {
    async fn connect(&self) -> Result<Box<dyn WatchStream>> {
        info!("connecting to {}", self.target);

        let channel = self.channel().await?;
        let mut client = EndpointsClient::new(channel)
            .max_decoding_message_size(self.max_msg_size)
            .max_encoding_message_size(self.max_msg_size);
        if self.enable_compression {
            client = client
                .send_compressed(CompressionEncoding::Gzip)
                .accept_compressed(CompressionEncoding::Gzip);
        }

        Ok(Box::new(GrpcWatchStream::new(client)))
    }
}

/// Splits a dial target into one URI per address.
///
/// Addresses without a scheme get `https://` when TLS is on and `http://`
/// otherwise.
pub(crate) fn parse_target(
    target: &str,
    secure: bool,
) -> Result<Vec<String>> {
    let addrs: Vec<&str> = match target.strip_prefix(MULTI_TARGET_PREFIX) {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .collect(),
        None => vec![target.trim()],
    };

    if addrs.is_empty() || addrs.iter().any(|addr| addr.is_empty()) {
        return Err(NetworkError::InvalidURI(target.to_string()).into());
    }

    let scheme = if secure { "https" } else { "http" };
    Ok(addrs
        .into_iter()
        .map(|addr| {
            if addr.contains("://") {
                addr.to_string()
            } else {
                format!("{scheme}://{addr}")
            }
        })
        .collect())
}

fn build_endpoint(
    uri: String,
    config: &ClientConfig,
    tls: Option<ClientTlsConfig>,
) -> Result<Endpoint> {
    debug!("build_endpoint, uri = {:?}", &uri);

    let mut endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|_| NetworkError::InvalidURI(uri))?
        .connect_timeout(config.connect_timeout())
        .tcp_keepalive(Some(config.tcp_keepalive()))
        .http2_keep_alive_interval(config.http2_keep_alive_interval())
        .keep_alive_timeout(config.http2_keep_alive_timeout());

    if let Some(tls) = tls {
        endpoint = endpoint.tls_config(tls)?;
    }

    Ok(endpoint)
}

enum Inbound {
    /// The call is opened on the first `recv`, once the first request is
    /// queued. Servers that only send response headers along with their
    /// first message would otherwise never answer the open.
    Pending {
        client: EndpointsClient<Channel>,
        requests: mpsc::Receiver<WatchReq>,
    },
    Open(Streaming<OpItem>),
    Closed,
}

/// One bidirectional `Watch` call.
pub struct GrpcWatchStream {
    outbound: Option<mpsc::Sender<WatchReq>>,
    inbound: Inbound,
}

impl GrpcWatchStream {
    fn new(client: EndpointsClient<Channel>) -> Self {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        Self {
            outbound: Some(tx),
            inbound: Inbound::Pending { client, requests: rx },
        }
    }

    async fn open(&mut self) -> Result<()> {
        if let Inbound::Pending { mut client, requests } = std::mem::replace(&mut self.inbound, Inbound::Closed) {
            let response = client.watch(ReceiverStream::new(requests)).await?;
            self.inbound = Inbound::Open(response.into_inner());
        }
        Ok(())
    }
}

#[async_trait]
impl WatchStream for GrpcWatchStream {
    async fn send(
        &mut self,
        req: WatchReq,
    ) -> Result<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| NetworkError::SendFailed("send side closed".to_string()))?;

        outbound
            .send(req)
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()).into())
    }

    async fn recv(&mut self) -> Result<OpItem> {
        self.open().await?;

        let next = match &mut self.inbound {
            Inbound::Open(stream) => stream.message().await?,
            _ => None,
        };

        match next {
            Some(op) => Ok(op),
            None => {
                self.inbound = Inbound::Closed;
                Err(NetworkError::StreamClosed.into())
            }
        }
    }

    fn close_send(&mut self) {
        self.outbound.take();
    }
}
