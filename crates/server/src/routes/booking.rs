use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::Redirect,
    Form, Json,
};
use service::booking::{BookingConfirmation, BookingRequest};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

/// HTML form target: store the booking, then send the browser on to WhatsApp.
#[utoipa::path(post, path = "/booking", tag = "booking",
    responses((status = 303, description = "Redirect to WhatsApp"), (status = 400, description = "Validation error")))]
pub async fn submit_form(State(state): State<ServerState>, form: Result<Form<BookingRequest>, FormRejection>) -> Result<Redirect, JsonApiError> {
    let Form(request) = form?;
    let confirmation = state.bookings.submit(request).await?;
    Ok(Redirect::to(&confirmation.whatsapp_url))
}

#[utoipa::path(post, path = "/api/bookings", tag = "booking", request_body = crate::openapi::BookingRequestDoc,
    responses((status = 201, description = "Booking stored"), (status = 400, description = "Validation error")))]
pub async fn submit_json(State(state): State<ServerState>, body: Result<Json<BookingRequest>, JsonRejection>) -> Result<(StatusCode, Json<BookingConfirmation>), JsonApiError> {
    let Json(request) = body?;
    let confirmation = state.bookings.submit(request).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}
