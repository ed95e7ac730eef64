//! Exchange-rate provider and the derived pairwise rate table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::http::{build_client, get_json, ProviderError};

/// Raw payload from an exchangerate-api style endpoint. This is also the
/// format written to the rate cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesPayload {
    pub result: String,
    pub time_last_update_unix: i64,
    /// Code -> units of that currency per one unit of the base currency
    #[serde(alias = "rates")]
    pub conversion_rates: BTreeMap<String, f64>,
}

impl RatesPayload {
    /// Parse and validate a payload from JSON
    pub fn from_json(json: serde_json::Value) -> Result<Self, ProviderError> {
        if json["result"].as_str() != Some("success") {
            return Err(ProviderError::Invalid(format!(
                "rate API result is {}",
                json["result"]
            )));
        }
        let has_rates = json["conversion_rates"].is_object() || json["rates"].is_object();
        if !has_rates {
            return Err(ProviderError::Invalid(
                "conversion_rates is missing or not an object".into(),
            ));
        }
        serde_json::from_value(json).map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// True when the payload is younger than `max_age_secs` at `now_unix`
    pub fn is_fresh(&self, now_unix: i64, max_age_secs: u64) -> bool {
        now_unix.saturating_sub(self.time_last_update_unix) < max_age_secs as i64
    }

    pub fn rate_table(&self) -> ConversionRateTable {
        ConversionRateTable::from_base_rates(&self.conversion_rates)
    }
}

/// Pairwise conversion rates: `rate(a, b)` units of `b` per one unit of `a`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionRateTable {
    rates: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ConversionRateTable {
    /// Symmetric closure over base-relative rates:
    /// `rate[a][b] = (1 / base[a]) * base[b]`
    pub fn from_base_rates(base: &BTreeMap<String, f64>) -> Self {
        let rates = base
            .iter()
            .map(|(from, from_rate)| {
                let row = base
                    .iter()
                    .map(|(to, to_rate)| (to.clone(), (1.0 / from_rate) * to_rate))
                    .collect();
                (from.clone(), row)
            })
            .collect();
        Self { rates }
    }

    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.rates.get(from)?.get(to).copied()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Exchange-rate API client (blocking).
pub struct RatesClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl RatesClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate the latest rates
    pub fn fetch(&self) -> Result<RatesPayload, ProviderError> {
        let json = get_json(&self.http, &self.url)?;
        RatesPayload::from_json(json)
    }
}
