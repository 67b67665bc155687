use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TokenResponse;

const REDACTED: &str = "<redacted>";

pub trait SecretsProvider {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str);

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)>;

    fn get_token_option_pair<'a>(&'a self) -> (Option<&'a str>, Option<&'a str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or_else(|| (None, None))
    }
}

/// A token credential pair as issued by the provider's token endpoints.
pub trait OAuthToken: Sized {
    fn from_pair(token: String, secret: String) -> Self;

    fn token(&self) -> &str;

    fn secret(&self) -> &str;
}

/// Consumer key and secret issued when the application was registered.
#[derive(Clone, PartialEq, Eq)]
pub struct ConsumerCredentials {
    key: String,
    secret: String,
}

impl ConsumerCredentials {
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        ConsumerCredentials {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Borrow these credentials as signing secrets without a token.
    pub fn secrets(&self) -> Secrets<'_, ()> {
        Secrets::new(self.key.as_str(), self.secret.as_str())
    }
}

impl fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .field("secret", &REDACTED)
            .finish()
    }
}

/// Temporary credentials obtained from the request-token endpoint.
///
/// The access-token exchange takes the request token by value, so it cannot
/// be sent as `oauth_token` once it has been exchanged.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestToken {
    token: String,
    secret: String,
}

/// Long-lived token credentials; owned by the caller after issuance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    token: String,
    secret: String,
}

macro_rules! token_pair {
    ($name:ident) => {
        impl $name {
            pub fn new<TKey, TSecret>(token: TKey, secret: TSecret) -> Self
            where
                TKey: Into<String>,
                TSecret: Into<String>,
            {
                $name {
                    token: token.into(),
                    secret: secret.into(),
                }
            }
        }

        impl OAuthToken for $name {
            fn from_pair(token: String, secret: String) -> Self {
                $name { token, secret }
            }

            fn token(&self) -> &str {
                &self.token
            }

            fn secret(&self) -> &str {
                &self.secret
            }
        }

        impl From<TokenResponse> for $name {
            fn from(resp: TokenResponse) -> Self {
                $name::from_pair(resp.oauth_token, resp.oauth_token_secret)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("token", &self.token)
                    .field("secret", &REDACTED)
                    .finish()
            }
        }
    };
}

token_pair!(RequestToken);
token_pair!(AccessToken);

#[derive(Clone)]
pub struct Secrets<'a, T> {
    token: T,
    token_secret: T,
    consumer_key: Cow<'a, str>,
    consumer_secret: Cow<'a, str>,
}

impl<'a> Secrets<'a, ()> {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        Secrets {
            token: (),
            token_secret: (),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn token<TKey, TSecret>(
        self,
        token: TKey,
        token_secret: TSecret,
    ) -> Secrets<'a, Cow<'a, str>>
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        Secrets {
            token: token.into(),
            token_secret: token_secret.into(),
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
        }
    }

    /// Attach a request or access token as the signing token credential.
    pub fn with<T: OAuthToken>(self, token: &'a T) -> Secrets<'a, Cow<'a, str>> {
        self.token(token.token(), token.secret())
    }
}

impl SecretsProvider for Secrets<'_, ()> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)> {
        None
    }
}

impl SecretsProvider for Secrets<'_, Cow<'_, str>> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair_option<'a>(&'a self) -> Option<(&'a str, &'a str)> {
        Some((&self.token, &self.token_secret))
    }
}
