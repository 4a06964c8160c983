//! OAuth2 client-credentials provider for the intranet service credential.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::TokenResponseDto;
use super::status::status_message;
use crate::domain::ports::{AccessToken, CredentialError, ServiceCredentialProvider};

/// Registered application credentials.
#[derive(Clone)]
pub struct IntraClientCredentials {
    client_id: String,
    client_secret: Zeroizing<String>,
}

impl IntraClientCredentials {
    /// Wrap an application identifier and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
        }
    }
}

impl fmt::Debug for IntraClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntraClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Acquires a bearer token with the `client_credentials` grant.
pub struct IntraOAuthCredentialProvider {
    client: Client,
    token_url: Url,
    credentials: IntraClientCredentials,
}

impl IntraOAuthCredentialProvider {
    /// Build a provider posting to `token_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        token_url: Url,
        credentials: IntraClientCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_url,
            credentials,
        })
    }

    fn token_request(&self) -> RequestBuilder {
        self.client
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
    }
}

fn map_status(status: StatusCode, body: &[u8]) -> CredentialError {
    let message = status_message(status, body);
    if status.is_client_error() {
        CredentialError::rejected(message)
    } else {
        CredentialError::transport(message)
    }
}

fn decode_token(body: &[u8]) -> Result<AccessToken, CredentialError> {
    let decoded: TokenResponseDto = serde_json::from_slice(body).map_err(|error| {
        CredentialError::decode(format!("invalid token response: {error}"))
    })?;
    let secret = Zeroizing::new(decoded.access_token);
    if secret.trim().is_empty() {
        return Err(CredentialError::decode("token response carried an empty access_token"));
    }
    Ok(AccessToken::new(secret.as_str()))
}

#[async_trait]
impl ServiceCredentialProvider for IntraOAuthCredentialProvider {
    async fn acquire_service_credential(&self) -> Result<AccessToken, CredentialError> {
        let response = self
            .token_request()
            .send()
            .await
            .map_err(|error| CredentialError::transport(error.to_string()))?;

        let status = response.status();
        let body = Zeroizing::new(
            response
                .bytes()
                .await
                .map_err(|error| CredentialError::transport(error.to_string()))?
                .to_vec(),
        );
        if !status.is_success() {
            return Err(map_status(status, body.as_slice()));
        }

        let token = decode_token(body.as_slice())?;
        debug!(client_id = %self.credentials.client_id, "service credential acquired");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    //! Token request shape and response handling without network access.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> IntraOAuthCredentialProvider {
        IntraOAuthCredentialProvider::new(
            Url::parse("https://api.intra.42.fr/oauth/token").expect("valid URL"),
            IntraClientCredentials::new("uid", "s3cr3t"),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[rstest]
    fn token_request_posts_client_credentials_form(provider: IntraOAuthCredentialProvider) {
        let request = provider.token_request().build().expect("request is valid");
        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/oauth/token");
        assert_eq!(
            body.as_deref(),
            Some("grant_type=client_credentials&client_id=uid&client_secret=s3cr3t")
        );
    }

    #[rstest]
    fn decodes_access_token() {
        let token = decode_token(br#"{"access_token":"abc","token_type":"bearer","expires_in":7200}"#)
            .expect("token decodes");
        assert_eq!(token.secret(), "abc");
    }

    #[rstest]
    #[case::missing(br#"{"token_type":"bearer"}"#.as_slice())]
    #[case::blank(br#"{"access_token":"  "}"#.as_slice())]
    fn unusable_token_responses_are_decode_errors(#[case] body: &[u8]) {
        assert!(matches!(
            decode_token(body),
            Err(CredentialError::Decode { .. })
        ));
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, true)]
    #[case::bad_request(StatusCode::BAD_REQUEST, true)]
    #[case::server_error(StatusCode::SERVICE_UNAVAILABLE, false)]
    fn client_errors_mean_rejected_credentials(#[case] status: StatusCode, #[case] rejected: bool) {
        let error = map_status(status, br#"{"error":"invalid_client"}"#);
        assert_eq!(matches!(error, CredentialError::Rejected { .. }), rejected);
    }

    #[rstest]
    fn debug_output_redacts_the_secret() {
        let rendered = format!("{:?}", IntraClientCredentials::new("uid", "s3cr3t"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
