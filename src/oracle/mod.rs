//! Oracles - fee and price snapshots from a mempool.space-compatible REST API.
//!
//! Both clients are stateless request/response wrappers: one GET, one typed
//! snapshot or one typed [`OracleError`].

mod fees;
mod price;

pub use fees::{FeeMenu, FeeOracle, FeePriority, FeeTier, MempoolFeeClient, RecommendedFees};
pub use price::{CurrencyCode, MempoolPriceClient, Price, PriceOracle};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::OracleError;

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, OracleError> {
    let url = Url::parse(raw.trim()).map_err(|e| OracleError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(OracleError::InvalidUrl(format!("unsupported scheme {other}"))),
    }
}

pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &Url) -> Result<T, OracleError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| OracleError::InvalidServerResponse(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(OracleError::InvalidServerResponse(format!("HTTP {status}")));
    }
    let body = response.bytes().await.map_err(|e| OracleError::InvalidServerResponse(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| OracleError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(parse_url("not a url"), Err(OracleError::InvalidUrl(_))));
        assert!(matches!(parse_url("ftp://mempool.space"), Err(OracleError::InvalidUrl(_))));
        assert!(parse_url(" https://mempool.space/api/v1/prices ").is_ok());
    }
}
