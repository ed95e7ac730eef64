//! HTTP providers used by the calculator: exchange rates, geolocation and
//! the AI completion endpoint.
//!
//! All clients are blocking (no Tokio runtime required). Callers decide
//! which thread a request runs on.

mod ai;
mod countries;
mod geo;
mod http;
mod rates;

pub use ai::AiClient;
pub use countries::currency_for_country;
pub use geo::GeoClient;
pub use http::ProviderError;
pub use rates::{ConversionRateTable, RatesClient, RatesPayload};
