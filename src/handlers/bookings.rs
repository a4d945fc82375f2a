use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::{ApiError, AppError};
use crate::models::{parse_status, Booking, BookingStats, Envelope, NewBooking};
use crate::state::AppState;

const CREATE_FAILED: &str = "Error creating booking";
const FETCH_FAILED: &str = "Error fetching bookings";
const DELETE_FAILED: &str = "Error deleting booking";
const STATUS_FAILED: &str = "Error updating booking status";

fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

fn malformed_query(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

fn malformed_path(rejection: PathRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Booking>>), ApiError> {
    let Json(payload) = payload.map_err(|e| malformed_body(e).context(CREATE_FAILED))?;

    let booking = state
        .store
        .insert(&payload)
        .map_err(|e| e.context(CREATE_FAILED))?;

    tracing::info!(booking_id = %booking.id, service = %booking.service, "booking created");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(booking).with_message("Booking created successfully")),
    ))
}

// GET /bookings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Booking>>>, ApiError> {
    let Query(query) = query.map_err(|e| malformed_query(e).context(FETCH_FAILED))?;

    // "all" is what the dashboard sends for an unfiltered view
    let status_filter = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all")
        .map(|s| parse_status(Some(s)))
        .transpose()
        .map_err(|e| AppError::from(e).context(FETCH_FAILED))?;

    let bookings = state
        .store
        .list_all(status_filter)
        .map_err(|e| e.context(FETCH_FAILED))?;

    Ok(Json(Envelope::list(bookings)))
}

// GET /bookings/stats
pub async fn booking_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<BookingStats>>, ApiError> {
    let stats = state
        .store
        .stats()
        .map_err(|e| e.context(FETCH_FAILED))?;

    Ok(Json(Envelope::data(stats)))
}

// DELETE /bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Envelope<Booking>>, ApiError> {
    let Path(id) = id.map_err(|e| malformed_path(e).context(DELETE_FAILED))?;

    let booking = state
        .store
        .delete_by_id(&id)
        .map_err(|e| e.context(DELETE_FAILED))?;

    tracing::info!(booking_id = %booking.id, "booking deleted");

    Ok(Json(
        Envelope::data(booking).with_message("Booking deleted successfully"),
    ))
}

// PATCH /bookings/:id/status
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Envelope<Booking>>, ApiError> {
    let Path(id) = id.map_err(|e| malformed_path(e).context(STATUS_FAILED))?;
    let Json(body) = body.map_err(|e| malformed_body(e).context(STATUS_FAILED))?;

    let booking = state
        .store
        .update_status(&id, body.status.as_deref())
        .map_err(|e| e.context(STATUS_FAILED))?;

    tracing::info!(booking_id = %booking.id, status = %booking.status, "booking status updated");

    Ok(Json(
        Envelope::data(booking).with_message("Booking status updated successfully"),
    ))
}
