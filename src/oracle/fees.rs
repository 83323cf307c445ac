//! Fee oracle and the four-tier fee menu offered to the send pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{get_json, http_client, parse_url};
use crate::core::keys::oracle as endpoints;
use crate::error::FeeError;

/// Recommended fee rates in sat/vB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFees {
    pub fastest_fee: u32,
    pub half_hour_fee: u32,
    pub hour_fee: u32,
    pub economy_fee: u32,
    pub minimum_fee: u32,
}

#[async_trait]
pub trait FeeOracle: Send + Sync {
    async fn fetch_fees(&self) -> Result<RecommendedFees, FeeError>;
}

pub struct MempoolFeeClient {
    client: Client,
    url: String,
}

impl MempoolFeeClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: http_client(timeout), url: url.into() }
    }
}

impl Default for MempoolFeeClient {
    fn default() -> Self {
        Self::new(endpoints::FEES_URL, Duration::from_secs(endpoints::HTTP_TIMEOUT_SECS))
    }
}

#[async_trait]
impl FeeOracle for MempoolFeeClient {
    async fn fetch_fees(&self) -> Result<RecommendedFees, FeeError> {
        let url = parse_url(&self.url)?;
        let fees: RecommendedFees = get_json(&self.client, &url).await?;
        tracing::debug!(fastest = fees.fastest_fee, minimum = fees.minimum_fee, "Fetched recommended fees");
        Ok(fees)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePriority { NoPriority, Low, Medium, High }

impl FeePriority {
    pub fn as_str(&self) -> &'static str {
        match self { Self::NoPriority => "No Priority", Self::Low => "Low", Self::Medium => "Medium", Self::High => "High" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTier {
    pub priority: FeePriority,
    pub sat_per_vb: u32,
}

/// Fee choices for one send, lowest priority first. Index 0 is selected initially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeMenu {
    tiers: [FeeTier; 4],
    selected: usize,
}

impl FeeMenu {
    pub fn from_fees(fees: &RecommendedFees) -> Self {
        let tier = |priority, sat_per_vb| FeeTier { priority, sat_per_vb };
        Self {
            tiers: [
                tier(FeePriority::NoPriority, fees.minimum_fee),
                tier(FeePriority::Low, fees.hour_fee),
                tier(FeePriority::Medium, fees.half_hour_fee),
                tier(FeePriority::High, fees.fastest_fee),
            ],
            selected: 0,
        }
    }

    pub fn tiers(&self) -> &[FeeTier] { &self.tiers }
    pub fn selected_index(&self) -> usize { self.selected }
    pub fn selected(&self) -> FeeTier { self.tiers[self.selected] }

    pub fn select(&mut self, index: usize) -> Option<FeeTier> {
        let tier = *self.tiers.get(index)?;
        self.selected = index;
        Some(tier)
    }
}
