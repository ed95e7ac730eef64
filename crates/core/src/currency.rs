//! Currency units: home currency, cached rates, unit registration.
//!
//! The home currency becomes a new base unit in the evaluator; every other
//! currency is registered as a multiple of it. Every network step fails
//! soft: geolocation falls back to `USD`, a failed rate fetch means the
//! session simply has no currency units.

use typecalc_config::settings::GeoProviderConfig;
use typecalc_config::store::KeyValueStore;
use typecalc_engine::{MathEvaluator, UnitDefinition};
use typecalc_providers::{ConversionRateTable, GeoClient, ProviderError, RatesClient, RatesPayload};

/// Store key for the cached rate payload
pub const RATES_CACHE_KEY: &str = "currenciesApiData";

pub const FALLBACK_CURRENCY: &str = "USD";

/// Something that can tell which currency the caller uses
pub trait GeoLookup {
    fn currency(&self, provider: &GeoProviderConfig) -> Result<String, ProviderError>;
}

impl GeoLookup for GeoClient {
    fn currency(&self, provider: &GeoProviderConfig) -> Result<String, ProviderError> {
        GeoClient::currency(self, provider)
    }
}

/// Source of fresh exchange rates
pub trait RatesSource {
    fn fetch(&self) -> Result<RatesPayload, ProviderError>;
}

impl RatesSource for RatesClient {
    fn fetch(&self) -> Result<RatesPayload, ProviderError> {
        RatesClient::fetch(self)
    }
}

/// Try each provider in order; the first success wins
pub fn resolve_home_currency<G: GeoLookup + ?Sized>(geo: &G, providers: &[GeoProviderConfig]) -> String {
    for provider in providers {
        match geo.currency(provider) {
            Ok(code) if is_currency_code(&code) => {
                log::info!("Home currency {} from {}", code, provider.url);
                return code.to_uppercase();
            }
            Ok(code) => log::warn!("{} returned unusable currency {:?}", provider.url, code),
            Err(e) => log::warn!("Home currency lookup via {} failed: {}", provider.url, e),
        }
    }
    log::warn!("All geolocation providers failed; falling back to {}", FALLBACK_CURRENCY);
    FALLBACK_CURRENCY.to_string()
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Cached rates if fresh, else fetch and overwrite the cache.
/// `None` means no currency units this session.
pub fn load_conversion_rates<S: RatesSource + ?Sized>(
    store: &mut dyn KeyValueStore,
    source: &S,
    now_unix: i64,
    max_age_secs: u64,
) -> Option<ConversionRateTable> {
    if let Some(cached) = cached_payload(store) {
        if cached.is_fresh(now_unix, max_age_secs) {
            log::info!("Currency conversion data taken from cache");
            return Some(cached.rate_table());
        }
        log::debug!("Cached rates are stale (updated at {})", cached.time_last_update_unix);
    }

    match source.fetch() {
        Ok(payload) => {
            match serde_json::to_string(&payload) {
                Ok(json) => {
                    if let Err(e) = store.set(RATES_CACHE_KEY, json) {
                        log::warn!("Could not cache currency rates: {}", e);
                    }
                }
                Err(e) => log::warn!("Could not serialize currency rates: {}", e),
            }
            Some(payload.rate_table())
        }
        Err(e) => {
            log::warn!("Failed to fetch currency rates: {}", e);
            None
        }
    }
}

fn cached_payload(store: &dyn KeyValueStore) -> Option<RatesPayload> {
    let raw = store.get(RATES_CACHE_KEY)?;
    let json: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Ignoring unreadable rate cache: {}", e);
            return None;
        }
    };
    RatesPayload::from_json(json)
        .map_err(|e| log::warn!("Ignoring invalid rate cache: {}", e))
        .ok()
}

/// What `provision_units` registered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisionReport {
    /// Unit name of the home currency, if it could be registered
    pub home_unit: Option<String>,
    /// Registered unit names (lower-case, or upper-case on collision)
    pub registered: Vec<String>,
    /// Codes that could be registered under neither name
    pub skipped: Vec<String>,
    pub rates_available: bool,
}

/// Register currency units. Returns false only when there is no rate table.
pub fn provision_units<E: MathEvaluator + ?Sized>(
    evaluator: &mut E,
    home: &str,
    rates: Option<&ConversionRateTable>,
) -> bool {
    provision_units_report(evaluator, home, rates).rates_available
}

pub fn provision_units_report<E: MathEvaluator + ?Sized>(
    evaluator: &mut E,
    home: &str,
    rates: Option<&ConversionRateTable>,
) -> ProvisionReport {
    let home = home.to_uppercase();
    let mut report = ProvisionReport::default();

    report.home_unit = register(evaluator, &home, || UnitDefinition::Base);
    if report.home_unit.is_none() {
        log::warn!("Couldn't add home currency {} as a unit", home);
    }

    let Some(rates) = rates else {
        return report;
    };
    report.rates_available = true;

    let Some(home_unit) = report.home_unit.clone() else {
        return report;
    };

    for code in rates.codes() {
        if code.eq_ignore_ascii_case(&home) {
            continue;
        }
        let Some(factor) = rates.rate(code, &home) else {
            continue;
        };
        let definition = || UnitDefinition::Scaled { factor, unit: home_unit.clone() };
        match register(evaluator, code, definition) {
            Some(name) => report.registered.push(name),
            None => {
                log::warn!(
                    "Couldn't add {} or {} as currency unit",
                    code.to_uppercase(),
                    code.to_lowercase()
                );
                report.skipped.push(code.to_string());
            }
        }
    }

    log::info!(
        "Registered {} currency units relative to {} ({} skipped)",
        report.registered.len(),
        home,
        report.skipped.len()
    );
    report
}

/// Lower-case name first, upper-case on failure
fn register<E: MathEvaluator + ?Sized>(
    evaluator: &mut E,
    code: &str,
    definition: impl Fn() -> UnitDefinition,
) -> Option<String> {
    let lower = code.to_lowercase();
    match evaluator.create_unit(&lower, definition()) {
        Ok(()) => return Some(lower),
        Err(e) => log::debug!("{}; trying upper-case", e),
    }
    let upper = code.to_uppercase();
    match evaluator.create_unit(&upper, definition()) {
        Ok(()) => Some(upper),
        Err(e) => {
            log::debug!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use typecalc_config::settings::GeoProviderKind;
    use typecalc_config::store::MemoryStore;
    use typecalc_engine::{Engine, Value};

    struct FakeGeo(Vec<Result<String, ProviderError>>);

    impl GeoLookup for FakeGeo {
        fn currency(&self, provider: &GeoProviderConfig) -> Result<String, ProviderError> {
            let idx: usize = provider.url.parse().unwrap();
            self.0[idx].clone()
        }
    }

    fn providers(n: usize) -> Vec<GeoProviderConfig> {
        (0..n)
            .map(|i| GeoProviderConfig { url: i.to_string(), kind: GeoProviderKind::IpapiCo })
            .collect()
    }

    struct FakeRates {
        payload: Result<RatesPayload, ProviderError>,
        calls: Cell<usize>,
    }

    impl RatesSource for FakeRates {
        fn fetch(&self) -> Result<RatesPayload, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            self.payload.clone()
        }
    }

    fn payload(updated: i64) -> RatesPayload {
        let rates: BTreeMap<String, f64> = [("USD", 1.0), ("INR", 83.0), ("CUP", 24.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        RatesPayload {
            result: "success".into(),
            time_last_update_unix: updated,
            conversion_rates: rates,
        }
    }

    #[test]
    fn test_home_currency_failover() {
        let geo = FakeGeo(vec![
            Err(ProviderError::Network("down".into())),
            Ok("eur".into()),
        ]);
        assert_eq!(resolve_home_currency(&geo, &providers(2)), "EUR");

        let geo = FakeGeo(vec![Ok("GBP".into()), Ok("EUR".into())]);
        assert_eq!(resolve_home_currency(&geo, &providers(2)), "GBP");
    }

    #[test]
    fn test_home_currency_falls_back_to_usd() {
        let geo = FakeGeo(vec![
            Err(ProviderError::Http(429, String::new())),
            Ok("not a code".into()),
        ]);
        assert_eq!(resolve_home_currency(&geo, &providers(2)), "USD");
        assert_eq!(resolve_home_currency(&geo, &[]), "USD");
    }

    #[test]
    fn test_rates_cache_hit() {
        let mut store = MemoryStore::new();
        store
            .set(RATES_CACHE_KEY, serde_json::to_string(&payload(1_000)).unwrap())
            .unwrap();
        let source = FakeRates { payload: Err(ProviderError::Network("offline".into())), calls: Cell::new(0) };

        let table = load_conversion_rates(&mut store, &source, 1_500, 3600).unwrap();
        assert_eq!(source.calls.get(), 0);
        assert_eq!(table.rate("USD", "INR"), Some(83.0));
    }

    #[test]
    fn test_stale_cache_is_refetched_and_overwritten() {
        let mut store = MemoryStore::new();
        store
            .set(RATES_CACHE_KEY, serde_json::to_string(&payload(1_000)).unwrap())
            .unwrap();
        let source = FakeRates { payload: Ok(payload(90_000)), calls: Cell::new(0) };

        assert!(load_conversion_rates(&mut store, &source, 100_000, 3600).is_some());
        assert_eq!(source.calls.get(), 1);
        let cached: RatesPayload =
            serde_json::from_str(&store.get(RATES_CACHE_KEY).unwrap()).unwrap();
        assert_eq!(cached.time_last_update_unix, 90_000);
    }

    #[test]
    fn test_failed_fetch_gives_no_table() {
        let mut store = MemoryStore::new();
        store.set(RATES_CACHE_KEY, "garbage".into()).unwrap();
        let source = FakeRates { payload: Err(ProviderError::Http(500, String::new())), calls: Cell::new(0) };
        assert!(load_conversion_rates(&mut store, &source, 0, 3600).is_none());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_provision_units() {
        let mut engine = Engine::new();
        let table = payload(0).rate_table();
        let report = provision_units_report(&mut engine, "INR", Some(&table));

        assert!(report.rates_available);
        assert_eq!(report.home_unit.as_deref(), Some("inr"));
        // "cup" is a volume unit, so the Cuban peso falls back to upper-case
        assert!(report.registered.contains(&"CUP".to_string()));
        assert!(report.registered.contains(&"usd".to_string()));
        assert!(report.skipped.is_empty());

        let out = engine
            .evaluate_batch(&["10 usd to inr".to_string(), "100 usd".to_string()])
            .unwrap();
        assert!((out[0].to_number().unwrap() - 830.0).abs() < 1e-9);
        assert!((out[1].to_number().unwrap() - 100.0).abs() < 1e-9);
        assert!(matches!(out[1], Value::Quantity { .. }));
    }

    #[test]
    fn test_provision_without_rates() {
        let mut engine = Engine::new();
        assert!(!provision_units(&mut engine, "usd", None));
        // Home unit is still created
        assert!(engine.has_unit("usd"));
    }

    #[test]
    fn test_provision_repeated_falls_back_then_skips() {
        let mut engine = Engine::new();
        let table = payload(0).rate_table();
        assert!(provision_units(&mut engine, "USD", Some(&table)));

        // Lower-case names are taken, so everything moves to upper-case
        let second = provision_units_report(&mut engine, "USD", Some(&table));
        assert_eq!(second.home_unit.as_deref(), Some("USD"));
        assert_eq!(second.registered, vec!["INR".to_string()]);
        assert_eq!(second.skipped, vec!["CUP".to_string()]);

        // Both names are taken for the home currency now
        let third = provision_units_report(&mut engine, "USD", Some(&table));
        assert!(third.home_unit.is_none());
        assert!(third.rates_available);
        assert!(third.registered.is_empty());
    }
}
