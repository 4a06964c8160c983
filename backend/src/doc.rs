//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the sync trigger, the health probes, and schema
//! wrappers for the domain error type. The document backs Swagger UI in debug
//! builds and is printed by the `openapi-dump` binary.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::sync::SyncSummaryBody;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus events sync API",
        description = "Trigger intranet event syncs and probe service health."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::sync::sync_events,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(SyncSummaryBody, ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "events", description = "Event catalogue sync"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
