//! Contact form intake

use crate::{
    error::{AppError, Result},
    extractors::LenientJson,
    middleware::rate_limit::rate_limit_middleware,
    models::{ContactForm, SubmissionResult},
    AppState,
};
use axum::{extract::State, middleware, routing::post, Json, Router};

pub fn create_contact_routes(state: &AppState, rate_limited: bool) -> Router<AppState> {
    let router = Router::new().route("/api/contact", post(handle_contact_submit));

    if rate_limited {
        router.route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
    } else {
        router
    }
}

/// POST /api/contact
///
/// Validates the form, relays it upstream and answers with the
/// `{success, message | error}` envelope. An unreadable body is answered with
/// the generic failure envelope rather than a client error.
pub async fn handle_contact_submit(
    State(state): State<AppState>,
    body: std::result::Result<LenientJson<ContactForm>, AppError>,
) -> Result<Json<SubmissionResult>> {
    let LenientJson(form) = match body {
        Ok(body) => body,
        Err(err) => {
            state.contact.record_internal_failure();
            return Err(err);
        }
    };

    let result = state.contact.submit(form).await?;
    Ok(Json(result))
}
