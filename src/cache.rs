//! Caller-side persistence for access tokens.
//!
//! The session never reads or writes a cache; callers combine the two, e.g.
//! through [`cached_or_authorize`].

use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AccessToken, CacheError, OAuthSession, Result};

/// Cached tokens older than this are refreshed by [`cached_or_authorize`].
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

/// An access token together with the moment it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccessToken {
    #[serde(flatten)]
    pub access_token: AccessToken,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

impl CachedAccessToken {
    /// Stamp `access_token` with the current time.
    pub fn new(access_token: AccessToken) -> Self {
        CachedAccessToken {
            access_token,
            timestamp: now_millis(),
        }
    }

    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.is_fresh_at(max_age, now_millis())
    }

    fn is_fresh_at(&self, max_age: Duration, now: u64) -> bool {
        now.saturating_sub(self.timestamp) <= max_age.as_millis() as u64
    }
}

/// A single-slot store for the application's access token.
pub trait TokenCache {
    fn load(&self) -> std::result::Result<Option<CachedAccessToken>, CacheError>;

    fn save(&self, token: &CachedAccessToken) -> std::result::Result<(), CacheError>;
}

/// Persists the cached token as JSON (`{"token", "secret", "timestamp"}`).
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(path: &Path, e: std::io::Error) -> CacheError {
        CacheError::Io(path.display().to_string(), e)
    }
}

impl TokenCache for FileTokenCache {
    fn load(&self) -> std::result::Result<Option<CachedAccessToken>, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            // first run: nothing cached yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, token: &CachedAccessToken) -> std::result::Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
        }
        let serialized = serde_json::to_vec(token)?;
        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("tmp");
        {
            let mut file = File::create(&tmp_path).map_err(|e| Self::io_error(&tmp_path, e))?;
            file.write_all(&serialized)
                .map_err(|e| Self::io_error(&tmp_path, e))?;
            file.sync_all().map_err(|e| Self::io_error(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| Self::io_error(&self.path, e))
    }
}

/// Keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenCache(Mutex<Option<CachedAccessToken>>);

impl TokenCache for MemoryTokenCache {
    fn load(&self) -> std::result::Result<Option<CachedAccessToken>, CacheError> {
        Ok(self.0.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &CachedAccessToken) -> std::result::Result<(), CacheError> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }
}

/// Return the cached access token while it is younger than `max_age`,
/// otherwise run the headless flow and cache its result.
pub async fn cached_or_authorize<C>(
    cache: &C,
    session: &mut OAuthSession,
    max_age: Duration,
) -> Result<AccessToken>
where
    C: TokenCache + ?Sized,
{
    if let Some(cached) = cache.load()? {
        if cached.is_fresh(max_age) {
            debug!(timestamp = cached.timestamp, "using cached access token");
            return Ok(cached.access_token);
        }
        debug!("cached access token is stale");
    }
    let access_token = session.authorize_self().await?;
    cache.save(&CachedAccessToken::new(access_token.clone()))?;
    Ok(access_token)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
