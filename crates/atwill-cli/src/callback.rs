//! Local listener for the OAuth redirect.

use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tiny_http::{Header, Response, Server, StatusCode};
use tracing::{debug, info};
use url::Url;

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>AtWill - Twitter Connected</title></head>
<body>
    <h1>&#x2713; Twitter linked</h1>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>
"#;

/// HTTP listener bound to the host and port of the redirect URI
pub struct CallbackListener {
    server: Server,
    redirect: Url,
    addr: SocketAddr,
}

impl CallbackListener {
    pub fn bind(redirect_uri: &str) -> Result<Self> {
        let mut redirect = Url::parse(redirect_uri).context("Invalid redirect URI")?;
        let host = redirect
            .host_str()
            .ok_or_else(|| anyhow!("Redirect URI has no host: {}", redirect_uri))?;
        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| anyhow!("Redirect URI has no port: {}", redirect_uri))?;

        let bind_addr = format!("{}:{}", host, port);
        let server = Server::http(&bind_addr)
            .map_err(|e| anyhow!("Failed to start callback server on {}: {}", bind_addr, e))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("Callback server is not listening on TCP"))?;

        // Port 0 binds an ephemeral port; report the real one in callback URLs
        redirect
            .set_port(Some(addr.port()))
            .map_err(|_| anyhow!("Cannot set port on redirect URI: {}", redirect_uri))?;

        Ok(Self {
            server,
            redirect,
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the provider redirects the browser to the redirect path.
    /// Returns the full callback URL, query included.
    pub fn wait(self, timeout: Duration) -> Result<String> {
        info!("Waiting for Twitter OAuth callback on {}", self.addr);

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let request = self
                .server
                .recv_timeout(remaining)
                .map_err(|e| anyhow!("Callback server error: {}", e))?
                .ok_or_else(|| anyhow!("Callback server timed out waiting for response"))?;

            let callback = self
                .redirect
                .join(request.url())
                .context("Failed to parse callback URL")?;
            debug!("Received request: {}", callback.path());

            // Browsers also ask for /favicon.ico and friends
            if callback.path() != self.redirect.path() {
                let _ = request.respond(Response::empty(StatusCode(404)));
                continue;
            }

            let content_type =
                Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                    .map_err(|_| anyhow!("Invalid content type header"))?;
            let _ = request.respond(Response::from_string(SUCCESS_HTML).with_header(content_type));

            return Ok(callback.to_string());
        }
    }
}
