// Session setup: settings, store, currency units and the AI fallback

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use typecalc_config::ai::AiPolicy;
use typecalc_config::settings::Settings;
use typecalc_config::store::{JsonFileStore, KeyValueStore, MemoryStore};
use typecalc_core::currency::{self, ProvisionReport};
use typecalc_core::Calculator;
use typecalc_engine::Engine;
use typecalc_providers::{AiClient, GeoClient, RatesClient};

use crate::CliError;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SessionOptions {
    /// No network at all: no currencies, no AI
    pub offline: bool,
    pub no_ai: bool,
}

pub(crate) fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load_from(&Settings::config_path()),
    };
    settings.apply_env_overrides();
    settings
}

pub(crate) fn open_store(path: Option<&Path>, offline: bool) -> Result<Box<dyn KeyValueStore>, CliError> {
    if offline {
        return Ok(Box::new(MemoryStore::new()));
    }
    let path = path.map(Path::to_path_buf).unwrap_or_else(JsonFileStore::default_path);
    let store = JsonFileStore::open(&path)
        .map_err(|e| CliError::io(e.to_string()).with_hint(format!("store file: {}", path.display())))?;
    Ok(Box::new(store))
}

fn http_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.http_timeout_secs)
}

/// Currency state of a session
#[derive(Debug, Clone)]
pub(crate) struct CurrencySetup {
    pub home: String,
    pub report: ProvisionReport,
}

impl CurrencySetup {
    pub fn loaded(&self) -> bool {
        self.report.rates_available && !self.report.registered.is_empty()
    }
}

/// Resolve the home currency, load rates and register units into `engine`
pub(crate) fn provision_currencies(
    engine: &mut Engine,
    settings: &Settings,
    store: &mut dyn KeyValueStore,
) -> Result<CurrencySetup, CliError> {
    let timeout = http_timeout(settings);

    let home = match &settings.home_currency {
        Some(code) => {
            log::info!("Home currency {} from settings", code);
            code.to_uppercase()
        }
        None => {
            let geo = GeoClient::new(timeout).map_err(|e| CliError::io(e.to_string()))?;
            currency::resolve_home_currency(&geo, &settings.geo_providers)
        }
    };

    let source = RatesClient::new(settings.rates_url.clone(), timeout)
        .map_err(|e| CliError::io(e.to_string()))?;
    let now = chrono::Utc::now().timestamp();
    let rates = currency::load_conversion_rates(store, &source, now, settings.cache_max_age_secs());

    let report = currency::provision_units_report(engine, &home, rates.as_ref());
    Ok(CurrencySetup { home, report })
}

/// Build a calculator for one CLI session
pub(crate) fn build_calculator(
    settings: &Settings,
    options: SessionOptions,
    store: &mut dyn KeyValueStore,
) -> Result<(Calculator<Engine>, Option<CurrencySetup>), CliError> {
    let mut engine = Engine::new();

    let currencies = if options.offline {
        None
    } else {
        Some(provision_currencies(&mut engine, settings, store)?)
    };

    let mut calc = Calculator::new(engine);

    let policy = AiPolicy::from_settings(settings);
    let endpoint = settings.ai_endpoint.as_deref().filter(|_| policy.enabled);
    if let (false, false, Some(endpoint)) = (options.offline, options.no_ai, endpoint) {
        let client = AiClient::new(endpoint, http_timeout(settings))
            .map_err(|e| CliError::io(e.to_string()))?;
        calc = calc.with_ai(Arc::new(client), policy);
    }

    Ok((calc, currencies))
}

/// How long to wait for the AI answer in non-interactive mode
pub(crate) fn ai_wait(settings: &Settings) -> Duration {
    http_timeout(settings) + Duration::from_secs(1)
}
