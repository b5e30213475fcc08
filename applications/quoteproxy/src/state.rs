use scannerpro::data::Client as DataClient;
use scannerpro::{Config, Error, Fetcher, UniverseRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct State {
    pub fetcher: Fetcher,
    pub environment: String,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let registry = match &config.universes_file {
            Some(path) => UniverseRegistry::from_file(path)?,
            None => UniverseRegistry::builtin(),
        };

        let data_client = DataClient::new(config.fmp_api_key.clone(), config.fmp_base_url.clone())?;

        Ok(State {
            fetcher: Fetcher::new(Arc::new(data_client), Arc::new(registry), config.batch),
            environment: config.environment.clone(),
        })
    }
}
