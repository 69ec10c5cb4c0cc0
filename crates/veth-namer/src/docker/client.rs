//! Minimal Docker Engine API client.
//!
//! Speaks HTTP/1.1 over the daemon's unix socket (or TCP) with one connection
//! per request, the way the Docker CLI does for short-lived calls.

use std::path::PathBuf;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

use super::events::EventStream;
use super::types::{ContainerInspect, ContainerSummary, ErrorResponse};
use super::{Container, ContainerRuntime};
use crate::error::{Error, Result};

/// Daemon address used when `DOCKER_HOST` is unset.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Highest API version this client speaks.
pub const DEFAULT_API_VERSION: &str = "1.51";

const USER_AGENT: &str = concat!("docker-veth-namer/", env!("CARGO_PKG_VERSION"));

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    fn parse(host: &str) -> Result<Self> {
        if let Some(path) = host.strip_prefix("unix://") {
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = host.strip_prefix("tcp://") {
            let addr = addr.trim_end_matches('/');
            if addr.is_empty() {
                return Err(Error::Config(format!("invalid DOCKER_HOST: {}", host)));
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        Err(Error::Config(format!(
            "unsupported DOCKER_HOST scheme: {} (expected unix:// or tcp://)",
            host
        )))
    }

    fn host_header(&self) -> &str {
        match self {
            Endpoint::Unix(_) => "localhost",
            Endpoint::Tcp(addr) => addr,
        }
    }
}

/// Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
    api_version: String,
}

impl DockerClient {
    /// Connect to the daemon named by `DOCKER_HOST`, negotiating the API
    /// version unless `DOCKER_API_VERSION` pins it.
    pub async fn connect_from_env() -> Result<Self> {
        let host = std::env::var("DOCKER_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());
        let pinned = std::env::var("DOCKER_API_VERSION")
            .ok()
            .filter(|v| !v.is_empty());

        Self::connect(&host, pinned.as_deref()).await
    }

    /// Connect to the daemon at `host` (`unix://...` or `tcp://...`).
    ///
    /// Pings the daemon; failing to reach it is an error.
    pub async fn connect(host: &str, pinned_version: Option<&str>) -> Result<Self> {
        let endpoint = Endpoint::parse(host)?;
        let mut client = Self {
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
        };

        let server_version = client.ping().await?;
        client.api_version = negotiate_version(pinned_version, server_version.as_deref());
        tracing::debug!(
            "connected to docker at {} (API {})",
            host,
            client.api_version
        );

        Ok(client)
    }

    /// API version used for requests.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `GET /_ping`, returning the daemon's `Api-Version` header.
    pub async fn ping(&self) -> Result<Option<String>> {
        let response = self.send("/_ping").await?;
        let version = response
            .headers()
            .get("api-version")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        check_status(response).await?;
        Ok(version)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(&self.versioned(path)).await?;
        let response = check_status(response).await?;
        let body = response.into_body().collect().await?.to_bytes();
        Ok(serde_json::from_slice(&body)?)
    }

    fn versioned(&self, path: &str) -> String {
        format!("/v{}{}", self.api_version, path)
    }

    async fn send(&self, path_and_query: &str) -> Result<Response<Incoming>> {
        let mut sender = match &self.endpoint {
            Endpoint::Unix(path) => handshake(UnixStream::connect(path).await?).await?,
            Endpoint::Tcp(addr) => handshake(TcpStream::connect(addr.as_str()).await?).await?,
        };

        let mut req = Request::builder()
            .method("GET")
            .uri(path_and_query)
            .body(Empty::<Bytes>::new())
            .map_err(|e| Error::Http(e.to_string()))?;
        let headers = req.headers_mut();
        headers.insert(
            header::HOST,
            HeaderValue::from_str(self.endpoint.host_header())
                .map_err(|e| Error::Http(e.to_string()))?,
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));

        tracing::trace!("docker request: GET {}", path_and_query);
        Ok(sender.send_request(req).await?)
    }
}

/// Perform the HTTP/1.1 handshake and drive the connection in the background.
async fn handshake<T>(stream: T) -> Result<http1::SendRequest<Empty<Bytes>>>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::Builder::new().handshake(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            let msg = e.to_string().to_lowercase();
            if !msg.contains("canceled") && !msg.contains("incomplete") {
                tracing::debug!("docker connection ended: {}", e);
            }
        }
    });

    Ok(sender)
}

/// Turn a non-success answer into `Error::Docker` carrying the daemon message.
async fn check_status(response: Response<Incoming>) -> Result<Response<Incoming>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.into_body().collect().await?.to_bytes();
    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());

    Err(Error::Docker {
        status: status.as_u16(),
        message,
    })
}

/// Pick the API version to speak.
///
/// A pinned version always wins. Otherwise the lower of the server's version
/// and [`DEFAULT_API_VERSION`] is used.
pub fn negotiate_version(pinned: Option<&str>, server: Option<&str>) -> String {
    if let Some(pinned) = pinned {
        return pinned.trim_start_matches('v').to_string();
    }

    match server.and_then(|s| parse_version(s).map(|v| (s, v))) {
        Some((s, server)) if parse_version(DEFAULT_API_VERSION).is_some_and(|d| server < d) => {
            s.to_string()
        }
        _ => DEFAULT_API_VERSION.to_string(),
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Query string selecting network connect events.
fn connect_events_query() -> String {
    let filters = serde_json::json!({
        "type": [super::NETWORK_EVENT_TYPE],
        "event": [super::CONNECT_ACTION],
    });
    format!("filters={}", urlencoding::encode(&filters.to_string()))
}

impl ContainerRuntime for DockerClient {
    type Events = EventStream<Incoming>;

    async fn running_containers(&self) -> Result<Vec<String>> {
        let containers: Vec<ContainerSummary> = self.get("/containers/json").await?;
        Ok(containers.into_iter().map(|c| c.id).collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<Container> {
        let inspect: ContainerInspect = self
            .get(&format!("/containers/{}/json", urlencoding::encode(id)))
            .await?;
        Ok(inspect.into())
    }

    async fn network_connect_events(&self) -> Result<Self::Events> {
        let path = self.versioned(&format!("/events?{}", connect_events_query()));
        let response = check_status(self.send(&path).await?).await?;
        Ok(EventStream::new(response.into_body()))
    }
}
