use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Url,
};
use tracing::{debug, info, instrument};

use crate::config::{AuditConfig, UsageWindow};

use super::{ApiResponse, ManagementApi};

/// Client for the Jamf Pro classic API (`JSSResource`).
pub struct JamfClient {
    client: reqwest::Client,
    base: Url,
}

impl JamfClient {
    pub fn new(config: &AuditConfig) -> Result<Self> {
        Self::from_builder(config, reqwest::Client::builder())
    }

    fn from_builder(config: &AuditConfig, builder: reqwest::ClientBuilder) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.credential))
            .context("API token contains characters that can't be sent in a header")?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));

        let mut builder = builder.default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to create http client")?,
            base: config.api_base.clone(),
        })
    }

    /// Appends `segments` to the base url. Segments are percent-encoded, so application names with
    /// spaces are safe to pass.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.base, segments)
    }

    async fn get(&self, url: Url) -> Result<ApiResponse> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;
        debug!("GET {url} returned {status}");
        Ok(ApiResponse::new(status, body))
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("API url {base} can't be used as a base for requests"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl ManagementApi for JamfClient {
    #[instrument(skip(self))]
    async fn computers_with_application(&self, application: &str) -> Result<ApiResponse> {
        let url = self.endpoint(&["computerapplications", "application", application])?;
        info!("App query URL: {url}");
        self.get(url).await
    }

    #[instrument(skip(self, window), fields(window = %window.to_query_segment()))]
    async fn application_usage(
        &self,
        serial_number: &str,
        window: &UsageWindow,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(&[
            "computerapplicationusage",
            "serialnumber",
            serial_number,
            &window.to_query_segment(),
        ])?;
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use chrono::NaiveDate;
    use reqwest::Url;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use crate::{
        api::{ApiResponse, ManagementApi},
        config::{AuditConfig, UsageWindow},
        utils::logging::TEST_LOGGING,
    };

    use super::{endpoint, JamfClient};

    /// Accepts a single connection, answers it with `response` and returns the request head.
    async fn serve_once(listener: TcpListener, response: &'static str) -> Result<String> {
        let (mut socket, _) = listener.accept().await?;
        let mut request = Vec::<u8>::new();
        let mut buffer = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
        }
        socket.write_all(response.as_bytes()).await?;
        socket.shutdown().await?;
        Ok(String::from_utf8(request)?)
    }

    async fn local_server() -> Result<(TcpListener, AuditConfig)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base = format!("http://{}/JSSResource/", listener.local_addr()?);
        let config = AuditConfig::new(&base, "secret", "Docker.app", 30)?;
        Ok((listener, config))
    }

    /// Environment proxies must not intercept requests to the local server.
    fn local_client(config: &AuditConfig) -> Result<JamfClient> {
        JamfClient::from_builder(config, reqwest::Client::builder().no_proxy())
    }

    #[tokio::test]
    async fn test_client_sends_headers_and_keeps_error_body() -> Result<()> {
        *TEST_LOGGING;
        let (listener, config) = local_server().await?;
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom",
        ));

        let response = local_client(&config)?
            .computers_with_application("Docker.app")
            .await?;
        let request = server.await??.to_lowercase();

        assert_eq!(response, ApiResponse::new(500, "boom"));
        assert!(!response.is_success());
        assert!(request
            .starts_with("get /jssresource/computerapplications/application/docker.app http/1.1\r\n"));
        assert!(request.contains("\r\nauthorization: bearer secret\r\n"));
        assert!(request.contains("\r\naccept: application/xml\r\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_client_usage_request() -> Result<()> {
        *TEST_LOGGING;
        let (listener, config) = local_server().await?;
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\nContent-Length: 29\r\nConnection: close\r\n\r\n<computer_application_usage/>",
        ));
        let window = UsageWindow::ending_on(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), 30);

        let response = local_client(&config)?
            .application_usage("C02A1", &window)
            .await?;
        let request = server.await??;

        assert_eq!(response, ApiResponse::ok("<computer_application_usage/>"));
        assert!(request.starts_with(
            "GET /JSSResource/computerapplicationusage/serialnumber/C02A1/2024-05-01_2024-05-31 HTTP/1.1\r\n"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_client_timeout() -> Result<()> {
        *TEST_LOGGING;
        let (listener, config) = local_server().await?;
        let config = config.with_timeout(Some(Duration::from_millis(200)));
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await?;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
            anyhow::Ok(())
        });

        let error = local_client(&config)?
            .computers_with_application("Docker.app")
            .await
            .unwrap_err();
        server.abort();

        assert!(error
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_timeout()));
        Ok(())
    }

    #[test]
    fn test_endpoint_with_trailing_slash() -> Result<()> {
        let base = Url::parse("https://example.jamfcloud.com/JSSResource/")?;
        let url = endpoint(&base, &["computerapplications", "application", "Docker.app"])?;
        assert_eq!(
            url.as_str(),
            "https://example.jamfcloud.com/JSSResource/computerapplications/application/Docker.app"
        );
        Ok(())
    }

    #[test]
    fn test_endpoint_without_trailing_slash() -> Result<()> {
        let base = Url::parse("https://example.jamfcloud.com/JSSResource")?;
        let url = endpoint(
            &base,
            &["computerapplicationusage", "serialnumber", "C02X", "2024-01-01_2024-01-31"],
        )?;
        assert_eq!(
            url.as_str(),
            "https://example.jamfcloud.com/JSSResource/computerapplicationusage/serialnumber/C02X/2024-01-01_2024-01-31"
        );
        Ok(())
    }

    #[test]
    fn test_endpoint_encodes_segments() -> Result<()> {
        let base = Url::parse("https://example.jamfcloud.com/JSSResource/")?;
        let url = endpoint(&base, &["computerapplications", "application", "Visual Studio Code.app"])?;
        assert!(url.as_str().ends_with("/application/Visual%20Studio%20Code.app"));
        Ok(())
    }

    #[test]
    fn test_client_rejects_header_breaking_token() -> Result<()> {
        let config = AuditConfig::new(
            "https://example.jamfcloud.com/JSSResource/",
            "bad\ntoken",
            "Docker.app",
            30,
        )?;
        assert!(JamfClient::new(&config).is_err());
        Ok(())
    }
}
