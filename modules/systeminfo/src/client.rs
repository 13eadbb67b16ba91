use anyhow::{anyhow, Result};
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;
use sweep_core::Credential;
use url::Url;

pub const SYSTEMINFO_PATH: &str = "/api/v1/systeminfo/?format=json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            user_agent: format!("serials/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport-level result of one GET, before any look at the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// An HTTP exchange completed. Non-2xx statuses land here too.
    Response { status: u16, body: String },
    /// The request failed below HTTP (DNS, connect, TLS, timeout, ...).
    Error { signal: String, detail: String },
    /// No HTTP client could be brought up to issue the request.
    Unavailable { detail: String },
}

/// Issues one authenticated GET. Implementations never fail: every problem is a `Transport`.
pub trait HttpGet: Send + Sync + 'static {
    fn get(&self, url: &str, credential: &Credential) -> impl Future<Output = Transport> + Send;
}

/// Build `{scheme}://{target}/api/v1/systeminfo/?format=json`, rejecting targets that
/// would change the path or query.
pub fn systeminfo_url(scheme: &str, target: &str) -> Result<Url> {
    let url = Url::parse(&format!("{}://{}{}", scheme, target, SYSTEMINFO_PATH))
        .map_err(|e| anyhow!("invalid target '{}': {}", target, e))?;
    if url.host_str().map_or(true, str::is_empty) || url.path() != "/api/v1/systeminfo/" || url.query() != Some("format=json") {
        return Err(anyhow!("invalid target '{}': not a host or address", target));
    }
    Ok(url)
}

/// reqwest-backed client. Certificates are not verified and redirects are not followed:
/// a 3xx answer is classified on its own body.
pub struct SystemInfoClient {
    client: std::result::Result<Client, String>,
}

impl SystemInfoClient {
    pub fn new(opts: &QueryOptions) -> Self {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .timeout(Duration::from_millis(opts.timeout_ms.max(1)))
            .connect_timeout(Duration::from_millis(opts.connect_timeout_ms.max(1)))
            .user_agent(opts.user_agent.clone())
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| format!("{:#}", anyhow::Error::new(e)));
        if let Err(e) = &client {
            log::error!("HTTP client unavailable: {}", e);
        }
        SystemInfoClient { client }
    }
}

impl HttpGet for SystemInfoClient {
    async fn get(&self, url: &str, credential: &Credential) -> Transport {
        let client = match &self.client {
            Ok(c) => c,
            Err(detail) => return Transport::Unavailable { detail: detail.clone() },
        };
        let resp = match client.get(url).basic_auth(&credential.username, Some(&credential.password)).send().await {
            Ok(r) => r,
            Err(e) => return transport_error(e),
        };
        let status = resp.status().as_u16();
        match resp.bytes().await {
            Ok(bytes) => {
                log::debug!("{} -> HTTP {} ({} bytes)", url, status, bytes.len());
                Transport::Response { status, body: String::from_utf8_lossy(&bytes).into_owned() }
            }
            Err(e) => transport_error(e),
        }
    }
}

fn transport_error(e: reqwest::Error) -> Transport {
    let signal = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_redirect() {
        "redirect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else if e.is_builder() {
        "url"
    } else {
        "request"
    };
    Transport::Error { signal: signal.to_string(), detail: format!("{:#}", anyhow::Error::new(e)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn cred() -> Credential {
        Credential { username: "user".into(), password: "pass".into() }
    }

    fn opts(timeout_ms: u64) -> QueryOptions {
        QueryOptions { timeout_ms, connect_timeout_ms: timeout_ms, ..QueryOptions::default() }
    }

    /// Serve one canned HTTP/1.1 response; the join handle yields the raw request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        serve_once_with(status_line, "", body).await
    }

    async fn serve_once_with(status_line: &'static str, extra_headers: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 { break; }
                buf.extend_from_slice(&chunk[..n]);
            }
            let resp = format!("HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}", status_line, extra_headers, body.len(), body);
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (addr, handle)
    }

    #[test]
    fn builds_systeminfo_url() {
        let u = systeminfo_url("https", "10.0.0.1").unwrap();
        assert_eq!(u.as_str(), "https://10.0.0.1/api/v1/systeminfo/?format=json");
        let u = systeminfo_url("https", "bmc-01.lab:8443").unwrap();
        assert_eq!(u.port(), Some(8443));
    }

    #[test]
    fn rejects_targets_that_are_not_hosts() {
        assert!(systeminfo_url("https", "bad host").is_err());
        assert!(systeminfo_url("https", "host/extra").is_err());
        assert!(systeminfo_url("https", "host?x=1").is_err());
        assert!(systeminfo_url("https", "").is_err());
    }

    #[tokio::test]
    async fn sends_basic_auth_and_captures_body() {
        let (addr, server) = serve_once("200 OK", "{\"sn\":\"SN9\"}").await;
        let client = SystemInfoClient::new(&opts(5_000));
        let url = systeminfo_url("http", &addr).unwrap();
        let t = client.get(url.as_str(), &cred()).await;
        assert_eq!(t, Transport::Response { status: 200, body: "{\"sn\":\"SN9\"}".into() });
        let head = server.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /api/v1/systeminfo/?format=json "));
        // base64("user:pass")
        assert!(head.contains("authorization: basic dxnlcjpwyxnz"));
    }

    #[tokio::test]
    async fn non_success_status_is_data() {
        let (addr, server) = serve_once("401 Unauthorized", "denied").await;
        let client = SystemInfoClient::new(&opts(5_000));
        let url = systeminfo_url("http", &addr).unwrap();
        let t = client.get(url.as_str(), &cred()).await;
        assert_eq!(t, Transport::Response { status: 401, body: "denied".into() });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn redirect_is_not_followed() {
        let (addr, server) = serve_once_with("302 Found", "Location: /login\r\n", "moved").await;
        let client = SystemInfoClient::new(&opts(2_000));
        let url = systeminfo_url("http", &addr).unwrap();
        let t = client.get(url.as_str(), &cred()).await;
        assert_eq!(t, Transport::Response { status: 302, body: "moved".into() });
        assert_eq!(crate::classify(&t), sweep_core::QueryOutcome::MalformedResponse("moved".into()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let client = SystemInfoClient::new(&opts(2_000));
        let url = systeminfo_url("http", &addr).unwrap();
        match client.get(url.as_str(), &cred()).await {
            Transport::Error { signal, detail } => {
                assert_eq!(signal, "connect");
                assert!(!detail.is_empty());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let hold = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            drop(sock);
        });
        let client = SystemInfoClient::new(&opts(200));
        let url = systeminfo_url("http", &addr).unwrap();
        match client.get(url.as_str(), &cred()).await {
            Transport::Error { signal, .. } => assert_eq!(signal, "timeout"),
            other => panic!("unexpected: {:?}", other),
        }
        hold.abort();
    }
}
