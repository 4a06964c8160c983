//! JSON 404 for requests no route matches.

use actix_web::{HttpRequest, HttpResponse};

use super::ApiResult;
use crate::domain::Error;

/// Default service answering unmatched routes with a `not_found` error body.
pub async fn route_not_found(request: HttpRequest) -> ApiResult<HttpResponse> {
    Err(Error::not_found(format!(
        "no route for {} {}",
        request.method(),
        request.path()
    )))
}
