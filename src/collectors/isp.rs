//! ISP identity via an external geolocation service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// Looks up the ISP name behind the host's public IP.
#[async_trait]
pub trait IspLookup: Send + Sync {
    /// ISP name, or `None` on any failure. One network attempt, no retries.
    async fn lookup(&self) -> Option<String>;
}

/// `GET https://ipinfo.io/json` and read the `org` field.
pub struct IpinfoLookup {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    org: Option<String>,
}

impl IpinfoLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl IspLookup for IpinfoLookup {
    async fn lookup(&self) -> Option<String> {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("ISP lookup request failed: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("ISP lookup returned status {}", response.status());
            return None;
        }
        match response.json::<IpinfoResponse>().await {
            Ok(body) => body.org,
            Err(e) => {
                warn!("ISP lookup body unreadable: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_field_is_optional() {
        let with: IpinfoResponse =
            serde_json::from_str(r#"{"ip":"1.2.3.4","org":"AS1234 Example ISP"}"#).unwrap();
        assert_eq!(with.org.as_deref(), Some("AS1234 Example ISP"));

        let without: IpinfoResponse = serde_json::from_str(r#"{"ip":"1.2.3.4"}"#).unwrap();
        assert!(without.org.is_none());
    }
}
