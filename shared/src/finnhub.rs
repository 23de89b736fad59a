use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PricePoint;

#[derive(Debug, Clone)]
pub struct FinnhubClient {
    pub base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "finnhubIndustry")]
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}

/// Column-oriented candle payload as returned by `/stock/candle`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Candles {
    pub s: String,
    #[serde(default)]
    pub t: Vec<i64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub c: Vec<f64>,
    #[serde(default)]
    pub v: Vec<f64>,
}

impl Candles {
    pub fn into_points(self, symbol: &str, resolution: &str) -> Result<Vec<PricePoint>> {
        match self.s.as_str() {
            "no_data" => return Ok(Vec::new()),
            "ok" => {}
            other => bail!("unexpected candle status for {}: {}", symbol, other),
        }

        let n = self.t.len();
        if [self.o.len(), self.h.len(), self.l.len(), self.c.len(), self.v.len()]
            .iter()
            .any(|&len| len != n)
        {
            bail!("candle arrays for {} have mismatched lengths", symbol);
        }

        let mut points = Vec::with_capacity(n);
        for i in 0..n {
            let time = DateTime::<Utc>::from_timestamp(self.t[i], 0)
                .ok_or_else(|| anyhow::anyhow!("invalid candle timestamp {}", self.t[i]))?;
            points.push(PricePoint {
                symbol: symbol.to_string(),
                resolution: resolution.to_string(),
                time,
                open: self.o[i],
                high: self.h[i],
                low: self.l[i],
                close: self.c[i],
                volume: self.v[i],
            });
        }
        Ok(points)
    }
}

impl FinnhubClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    pub async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let response = self
            .http
            .get(format!("{}/stock/profile2", self.base_url))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let profile: CompanyProfile = response.json().await?;
        Ok(profile)
    }

    pub async fn candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let from = from.timestamp().to_string();
        let to = to.timestamp().to_string();
        let response = self
            .http
            .get(format!("{}/stock/candle", self.base_url))
            .query(&[
                ("symbol", symbol),
                ("resolution", resolution),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let candles: Candles = response.json().await?;
        candles.into_points(symbol, resolution)
    }
}
