//! Where to fetch from, read from the environment
use std::collections::HashMap;

use envconfig::Envconfig;
use thiserror::Error;
use url::Url;

/// Configuration of the fetch pipeline.
///
/// The `default` of each variable is the only place its default is spelled
/// out, [PetitionsConfig::default] reads them from there.
#[derive(Envconfig, Debug, Clone, PartialEq, Eq)]
pub struct PetitionsConfig {
    /// Feed URL without the page size parameter
    #[envconfig(
        from = "PETITIONS_ENDPOINT",
        default = "https://api.whitehouse.gov/v1/petitions.json"
    )]
    pub endpoint: String,

    /// Number of petitions requested in the single page we fetch
    #[envconfig(from = "PETITIONS_LIMIT", default = "15")]
    pub limit: u32,
}

impl Default for PetitionsConfig {
    fn default() -> Self {
        Self::init_from_hashmap(&HashMap::new()).expect("Every variable has a default")
    }
}

impl PetitionsConfig {
    /// Read the configuration from `PETITIONS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::init_from_env()?)
    }

    /// Read the configuration from a map of variables instead of the process
    /// environment
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self::init_from_hashmap(vars)?)
    }

    /// Full URL of the request, `endpoint` with `limit` as query parameter.
    ///
    /// Any query already present on `endpoint` is replaced.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(self.endpoint.clone(), e))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }
}

/// Errors reading or applying the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error(transparent)]
    Env(#[from] envconfig::Error),
    /// The endpoint is not an absolute URL
    #[error("Invalid endpoint URL: {0} {1}")]
    InvalidEndpoint(String, url::ParseError),
    /// A page of zero petitions was requested
    #[error("Page size limit must be at least 1")]
    ZeroLimit,
}
