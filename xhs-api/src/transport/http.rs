//! reqwest-backed transports.
//!
//! Both hold a lazily built client: nothing is allocated until the first
//! call, then the same connection pool serves every request.

use super::{AsyncTransport, HttpRequest, HttpResponse, Method, Transport, TransportError};
use crate::config::ClientConfig;
use crate::error::{Result, XhsError};
use async_trait::async_trait;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
struct HttpSettings {
    timeout: Duration,
    proxy: Option<String>,
}

impl HttpSettings {
    fn from_config(config: &ClientConfig) -> Result<Self> {
        if let Some(proxy) = &config.proxy {
            reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| XhsError::Config(format!("invalid proxy {proxy}: {e}")))?;
        }
        Ok(Self {
            timeout: config.timeout,
            proxy: config.proxy.clone(),
        })
    }

    fn proxy(&self) -> std::result::Result<Option<reqwest::Proxy>, TransportError> {
        self.proxy
            .as_deref()
            .map(reqwest::Proxy::all)
            .transpose()
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
    }
}

/// Blocking transport over [`reqwest::blocking::Client`].
#[derive(Debug)]
pub struct ReqwestTransport {
    settings: HttpSettings,
    client: OnceLock<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    /// Validate the proxy setting now; the client itself is built on first use.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            settings: HttpSettings::from_config(config)?,
            client: OnceLock::new(),
        })
    }

    fn client(&self) -> std::result::Result<&reqwest::blocking::Client, TransportError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let mut builder = reqwest::blocking::Client::builder().timeout(self.settings.timeout);
        if let Some(proxy) = self.settings.proxy()? {
            builder = builder.proxy(proxy);
        }
        let client = builder.build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut req = self
            .client()?
            .request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }
        let resp = req.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpResponse { status, body })
    }
}

/// Async transport over [`reqwest::Client`].
#[derive(Debug)]
pub struct AsyncReqwestTransport {
    settings: HttpSettings,
    client: OnceCell<reqwest::Client>,
}

impl AsyncReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            settings: HttpSettings::from_config(config)?,
            client: OnceCell::new(),
        })
    }

    async fn client(&self) -> std::result::Result<&reqwest::Client, TransportError> {
        self.client
            .get_or_try_init(|| async {
                let mut builder = reqwest::Client::builder().timeout(self.settings.timeout);
                if let Some(proxy) = self.settings.proxy()? {
                    builder = builder.proxy(proxy);
                }
                Ok::<_, TransportError>(builder.build()?)
            })
            .await
    }
}

#[async_trait]
impl AsyncTransport for AsyncReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut req = self
            .client()
            .await?
            .request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_lazy() {
        let t = ReqwestTransport::new(&ClientConfig::default()).unwrap();
        assert!(t.client.get().is_none());
    }
}
