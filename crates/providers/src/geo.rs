//! Geolocation lookup: which currency does the caller's IP use?

use std::time::Duration;

use typecalc_config::settings::{GeoProviderConfig, GeoProviderKind};

use crate::countries::currency_for_country;
use crate::http::{build_client, get_json, ProviderError};

/// Geolocation client (blocking).
pub struct GeoClient {
    http: reqwest::blocking::Client,
}

impl GeoClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self { http: build_client(timeout)? })
    }

    /// Ask one provider for the caller's currency code (upper-case)
    pub fn currency(&self, provider: &GeoProviderConfig) -> Result<String, ProviderError> {
        let json = get_json(&self.http, &provider.url)?;
        currency_from_response(provider.kind, &json)
    }
}

fn currency_from_response(
    kind: GeoProviderKind,
    json: &serde_json::Value,
) -> Result<String, ProviderError> {
    let country = match kind {
        GeoProviderKind::IpapiCo => {
            if let Some(currency) = json["currency"].as_str().filter(|c| !c.is_empty()) {
                return Ok(currency.to_uppercase());
            }
            json["country"].as_str()
        }
        GeoProviderKind::IpApiCom => json["countryCode"].as_str(),
    };

    let country = country
        .ok_or_else(|| ProviderError::Invalid("no currency or country in response".into()))?;
    currency_for_country(country)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Invalid(format!("unknown country code {}", country)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider(url: String, kind: GeoProviderKind) -> GeoProviderConfig {
        GeoProviderConfig { url, kind }
    }

    #[test]
    fn test_ipapi_prefers_currency_field() {
        let json = serde_json::json!({ "currency": "inr", "country": "US" });
        assert_eq!(currency_from_response(GeoProviderKind::IpapiCo, &json).unwrap(), "INR");

        let json = serde_json::json!({ "country": "JP" });
        assert_eq!(currency_from_response(GeoProviderKind::IpapiCo, &json).unwrap(), "JPY");
    }

    #[test]
    fn test_ip_api_uses_country_code() {
        let json = serde_json::json!({ "status": "success", "countryCode": "BR" });
        assert_eq!(currency_from_response(GeoProviderKind::IpApiCom, &json).unwrap(), "BRL");

        // ip-api.com has no currency field semantics
        let json = serde_json::json!({ "currency": "EUR" });
        assert!(currency_from_response(GeoProviderKind::IpApiCom, &json).is_err());
    }

    #[test]
    fn test_unknown_country_is_an_error() {
        let json = serde_json::json!({ "countryCode": "ZZ" });
        assert!(matches!(
            currency_from_response(GeoProviderKind::IpApiCom, &json),
            Err(ProviderError::Invalid(_))
        ));
    }

    #[test]
    fn test_currency_over_http() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/json/");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "ip": "1.2.3.4", "currency": "GBP" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/limited/");
            then.status(429).body("RateLimited");
        });

        let client = GeoClient::new(Duration::from_secs(5)).unwrap();
        let ok = provider(server.url("/json/"), GeoProviderKind::IpapiCo);
        assert_eq!(client.currency(&ok).unwrap(), "GBP");

        let limited = provider(server.url("/limited/"), GeoProviderKind::IpapiCo);
        assert!(matches!(client.currency(&limited), Err(ProviderError::Http(429, _))));
    }
}
