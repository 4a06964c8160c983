//! Server construction and route wiring.

use std::net::SocketAddr;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use campus_events::ApiDoc;
use campus_events::inbound::http::fallback::route_not_found;
use campus_events::inbound::http::health::{HealthState, live, ready};
use campus_events::inbound::http::request_span::RequestSpan;
use campus_events::inbound::http::state::HttpState;
use campus_events::inbound::http::sync::sync_events;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1").service(sync_events);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(RequestSpan)
        .service(api)
        .service(ready)
        .service(live)
        .default_service(web::to(route_not_found));

    #[cfg(debug_assertions)]
    let app =
        app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the HTTP server on `bind_addr`.
///
/// # Errors
///
/// Returns an I/O error when the address cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    bind_addr: SocketAddr,
) -> std::io::Result<Server> {
    let server = HttpServer::new(move || build_app(health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .run();
    Ok(server)
}
