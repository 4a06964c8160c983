//! OpenAPI schema definitions for domain types.
//!
//! Domain types do not derive `ToSchema`; these wrappers describe them for
//! the generated document without coupling the domain to utoipa.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The intranet rejected the service credential.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// No route matches the request.
    #[schema(rename = "not_found")]
    NotFound,
    /// A sync run is already in progress.
    #[schema(rename = "conflict")]
    Conflict,
    /// The intranet or the database is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    /// Human-readable message.
    #[schema(example = "an event sync is already running")]
    message: String,
    /// Supplementary error details.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    #[rstest]
    fn error_code_schema_lists_every_code() {
        let rendered = serde_json::to_string(&ErrorCodeSchema::schema()).expect("schema renders");
        for code in [
            "unauthorized",
            "not_found",
            "conflict",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(rendered.contains(code), "missing {code}");
        }
    }
}
