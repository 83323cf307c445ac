//! Price oracle: BTC exchange rates.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{get_json, http_client, parse_url};
use crate::core::keys::oracle as endpoints;
use crate::error::PriceError;

/// Price of one BTC. `usd` is always present; other currencies when served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub time: Option<u64>,
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "EUR", default)]
    pub eur: Option<f64>,
    #[serde(rename = "GBP", default)]
    pub gbp: Option<f64>,
    #[serde(rename = "CAD", default)]
    pub cad: Option<f64>,
    #[serde(rename = "CHF", default)]
    pub chf: Option<f64>,
    #[serde(rename = "AUD", default)]
    pub aud: Option<f64>,
    #[serde(rename = "JPY", default)]
    pub jpy: Option<f64>,
}

impl Price {
    pub fn usd(usd: f64) -> Self {
        Self { time: None, usd, eur: None, gbp: None, cad: None, chf: None, aud: None, jpy: None }
    }

    pub fn rate(&self, code: CurrencyCode) -> Option<f64> {
        match code {
            CurrencyCode::Usd => Some(self.usd),
            CurrencyCode::Eur => self.eur,
            CurrencyCode::Gbp => self.gbp,
            CurrencyCode::Cad => self.cad,
            CurrencyCode::Chf => self.chf,
            CurrencyCode::Aud => self.aud,
            CurrencyCode::Jpy => self.jpy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrencyCode { Usd, Eur, Gbp, Cad, Chf, Aud, Jpy }

impl CurrencyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD", Self::Eur => "EUR", Self::Gbp => "GBP", Self::Cad => "CAD",
            Self::Chf => "CHF", Self::Aud => "AUD", Self::Jpy => "JPY",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd), "EUR" => Some(Self::Eur), "GBP" => Some(Self::Gbp),
            "CAD" => Some(Self::Cad), "CHF" => Some(Self::Chf), "AUD" => Some(Self::Aud),
            "JPY" => Some(Self::Jpy),
            _ => None,
        }
    }
}

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn fetch_price(&self) -> Result<Price, PriceError>;
}

pub struct MempoolPriceClient {
    client: Client,
    url: String,
}

impl MempoolPriceClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: http_client(timeout), url: url.into() }
    }
}

impl Default for MempoolPriceClient {
    fn default() -> Self {
        Self::new(endpoints::PRICES_URL, Duration::from_secs(endpoints::HTTP_TIMEOUT_SECS))
    }
}

#[async_trait]
impl PriceOracle for MempoolPriceClient {
    async fn fetch_price(&self) -> Result<Price, PriceError> {
        let url = parse_url(&self.url)?;
        let price: Price = get_json(&self.client, &url).await?;
        tracing::debug!(usd = price.usd, "Fetched price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mempool_prices() {
        let json = r#"{"time":1703252411,"USD":43753,"EUR":40545,"GBP":34880,"CAD":58505,"CHF":37629,"AUD":64638,"JPY":6221461}"#;
        let price: Price = serde_json::from_str(json).unwrap();
        assert_eq!(price.time, Some(1703252411));
        assert_eq!(price.rate(CurrencyCode::Usd), Some(43753.0));
        assert_eq!(price.rate(CurrencyCode::Jpy), Some(6221461.0));
    }

    #[test]
    fn missing_usd_is_a_decode_error() {
        assert!(serde_json::from_str::<Price>(r#"{"EUR":1.0}"#).is_err());
        let usd_only: Price = serde_json::from_str(r#"{"USD":0}"#).unwrap();
        assert_eq!(usd_only, Price::usd(0.0));
        assert_eq!(usd_only.rate(CurrencyCode::Eur), None);
    }

    #[test]
    fn currency_codes_parse() {
        assert_eq!(CurrencyCode::from_str("chf"), Some(CurrencyCode::Chf));
        assert_eq!(CurrencyCode::from_str("XAU"), None);
    }
}
