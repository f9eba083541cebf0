//! ARS/USD quote lookup.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::dto::lenient;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current ARS per USD rate, always positive.
    async fn current_rate(&self) -> anyhow::Result<Decimal>;
}

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(default, deserialize_with = "lenient::decimal")]
    venta: Option<Decimal>,
}

/// Quote endpoint in the dolarapi.com format (`{ "venta": 1234.5, ... }`).
pub struct DolarApiProvider {
    url: String,
    client: reqwest::Client,
}

impl DolarApiProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl RateProvider for DolarApiProvider {
    async fn current_rate(&self) -> anyhow::Result<Decimal> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("quote endpoint answered {}", resp.status());
        }
        let quote: QuoteResponse = resp.json().await?;
        match quote.venta {
            Some(rate) if rate > Decimal::ZERO => Ok(rate),
            Some(rate) => anyhow::bail!("quote endpoint returned non-positive rate {rate}"),
            None => anyhow::bail!("quote endpoint response has no venta field"),
        }
    }
}

/// Constant rate, for seeding and tests.
pub struct FixedRate(pub Decimal);

#[async_trait]
impl RateProvider for FixedRate {
    async fn current_rate(&self) -> anyhow::Result<Decimal> {
        if self.0 <= Decimal::ZERO {
            anyhow::bail!("fixed rate must be positive");
        }
        Ok(self.0)
    }
}

/// Rate from `provider`, or `None` when the quote cannot be obtained.
pub async fn quote_or_none(provider: &dyn RateProvider) -> Option<Decimal> {
    match provider.current_rate().await {
        Ok(rate) => Some(rate),
        Err(err) => {
            tracing::warn!(error = %err, "exchange rate unavailable");
            None
        }
    }
}
