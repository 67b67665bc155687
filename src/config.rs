use std::time::Duration;

use url::Url;

use crate::ConfigurationError;

/// Base URL of the Khan Academy API.
pub const DEFAULT_BASE_URL: &str = "https://www.khanacademy.org";

const REQUEST_TOKEN_PATH: &str = "/api/auth2/request_token";
const AUTHORIZE_PATH: &str = "/api/auth2/authorize";
const ACCESS_TOKEN_PATH: &str = "/api/auth2/access_token";

pub const CONSUMER_KEY_ENV: &str = "KHAN_CONSUMER_KEY";
pub const CONSUMER_SECRET_ENV: &str = "KHAN_CONSUMER_SECRET";
pub const IDENTIFIER_ENV: &str = "KHAN_IDENTIFIER";
pub const PASSWORD_ENV: &str = "KHAN_PASSWORD";
pub const BASE_URL_ENV: &str = "KHAN_BASE_URL";

/// Provider endpoints used by the handshake and by resource requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base: Url,
    pub request_token: Url,
    pub authorize: Url,
    pub access_token: Url,
}

impl Endpoints {
    /// Derive every endpoint from `base`.
    pub fn with_base(base: &str) -> Result<Self, ConfigurationError> {
        let base = parse_url(base)?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| ConfigurationError::InvalidUrl(path.to_string(), e))
        };
        Ok(Endpoints {
            request_token: join(REQUEST_TOKEN_PATH)?,
            authorize: join(AUTHORIZE_PATH)?,
            access_token: join(ACCESS_TOKEN_PATH)?,
            base,
        })
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        // the default base is a constant and always joins cleanly
        Endpoints::with_base(DEFAULT_BASE_URL).expect("default base URL is valid")
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct Config {
    endpoints: Endpoints,
    timeout: Option<Duration>,
    oauth_version: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoints: Endpoints::default(),
            timeout: None,
            oauth_version: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    /// Read `KHAN_BASE_URL`, falling back to the public API when unset.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(base) => Config::new().base_url(&base),
            Err(_) => Ok(Config::new()),
        }
    }

    /// Point every endpoint at another host, e.g. a staging or mock server.
    pub fn base_url(self, base: &str) -> Result<Self, ConfigurationError> {
        Ok(Config {
            endpoints: Endpoints::with_base(base)?,
            ..self
        })
    }

    pub fn endpoints(self, endpoints: Endpoints) -> Self {
        Config { endpoints, ..self }
    }

    /// Bound every HTTP call made by the session.
    pub fn timeout(self, timeout: Duration) -> Self {
        Config {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Whether `oauth_version=1.0` is sent with every signature (default `true`).
    pub fn oauth_version(self, oauth_version: bool) -> Self {
        Config {
            oauth_version,
            ..self
        }
    }

    pub fn get_endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_oauth_version(&self) -> bool {
        self.oauth_version
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, ConfigurationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(ConfigurationError::HttpClient)
    }
}

/// Credentials read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub identifier: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Read `KHAN_CONSUMER_KEY` and `KHAN_CONSUMER_SECRET` (required) along with
    /// `KHAN_IDENTIFIER` and `KHAN_PASSWORD` (optional, headless flow only).
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let required = |name: &'static str| {
            std::env::var(name).map_err(|_| ConfigurationError::MissingEnv(name))
        };
        Ok(Credentials {
            consumer_key: required(CONSUMER_KEY_ENV)?,
            consumer_secret: required(CONSUMER_SECRET_ENV)?,
            identifier: std::env::var(IDENTIFIER_ENV).ok(),
            password: std::env::var(PASSWORD_ENV).ok(),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigurationError> {
    Url::parse(raw).map_err(|e| ConfigurationError::InvalidUrl(raw.to_string(), e))
}
