//! Driven port for acquiring the service-level intranet credential.
//!
//! The credential is acquired once per sync run. It belongs to the service,
//! not to any end user.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::define_port_error;

/// Bearer token presented to the intranet API.
///
/// The secret is wiped from memory on drop and never printed by `Debug`.
///
/// # Examples
/// ```
/// use campus_events::domain::ports::AccessToken;
///
/// let token = AccessToken::new("s3cr3t");
/// assert_eq!(token.secret(), "s3cr3t");
/// assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw bearer token.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Expose the raw token for building an `Authorization` header.
    pub fn secret(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

define_port_error! {
    /// Errors raised while acquiring the service credential.
    pub enum CredentialError {
        /// The token endpoint refused the client credentials.
        Rejected { message: String } =>
            "intranet rejected service credentials: {message}",
        /// The token endpoint could not be reached or answered with a server error.
        Transport { message: String } =>
            "credential request failed: {message}",
        /// The token response could not be decoded.
        Decode { message: String } =>
            "credential response decode failed: {message}",
    }
}

/// Port for acquiring the service-level bearer credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceCredentialProvider: Send + Sync {
    /// Acquire a bearer token valid for the duration of one sync run.
    async fn acquire_service_credential(&self) -> Result<AccessToken, CredentialError>;
}

/// Fixture provider handing out a fixed token.
#[derive(Debug, Clone)]
pub struct FixtureServiceCredentialProvider {
    token: AccessToken,
}

impl FixtureServiceCredentialProvider {
    /// Build a provider that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

impl Default for FixtureServiceCredentialProvider {
    fn default() -> Self {
        Self::new("fixture-token")
    }
}

#[async_trait]
impl ServiceCredentialProvider for FixtureServiceCredentialProvider {
    async fn acquire_service_credential(&self) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}
