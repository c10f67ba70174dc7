use std::convert::Infallible;

use axum::{
	Json, Router,
	body::Body,
	extract::{State, rejection::JsonRejection},
	http::{HeaderName, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use futures::StreamExt;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use magen_service::{ChatRequest, ChatStream, Error, StreamFrame, TitleRequest, TitleResponse};

use crate::state::AppState;

const CHAT_FAILURE: &str = "Failed to process your request";
const TITLE_FAILURE: &str = "Failed to generate title";
const INVALID_BODY: &str = "Request body must be a JSON object";
const SOURCE_TYPE_HEADER: &str = "x-source-type";

pub fn router(state: AppState) -> Router {
	let cors_permissive = state.service.cfg.service.cors_permissive;
	let router = Router::new()
		.route("/health", get(health))
		.route("/api/health", get(readiness))
		.route("/api/chat", post(chat))
		.route("/api/generate-title", post(generate_title))
		.with_state(state);

	if cors_permissive { router.layer(CorsLayer::permissive()) } else { router }
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn readiness(State(state): State<AppState>) -> Response {
	match state.service.readiness().await {
		Ok(()) => Json(HealthBody { status: "ok", message: None }).into_response(),
		Err(_) => (
			StatusCode::SERVICE_UNAVAILABLE,
			Json(HealthBody { status: "error", message: Some("Service unavailable") }),
		)
			.into_response(),
	}
}

async fn chat(
	State(state): State<AppState>,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
	let Json(payload) = payload.map_err(ApiError::from_rejection)?;

	if payload.stream {
		let stream = state
			.service
			.chat_stream(payload)
			.await
			.map_err(|err| ApiError::from_service(err, CHAT_FAILURE))?;

		return Ok(stream_response(stream, &state.service.cfg.answer.stream_error_marker));
	}

	let response =
		state.service.chat(payload).await.map_err(|err| ApiError::from_service(err, CHAT_FAILURE))?;

	Ok(Json(response).into_response())
}

async fn generate_title(
	State(state): State<AppState>,
	payload: Result<Json<TitleRequest>, JsonRejection>,
) -> Result<Json<TitleResponse>, ApiError> {
	let Json(payload) = payload.map_err(ApiError::from_rejection)?;
	let response = state
		.service
		.generate_title(payload)
		.await
		.map_err(|err| ApiError::from_service(err, TITLE_FAILURE))?;

	Ok(Json(response))
}

/// Writes frames as a raw chunked body. Status and headers are already committed, so a
/// failure mid-answer can only be signalled in-band by the error marker.
fn stream_response(stream: ChatStream, error_marker: &str) -> Response {
	let error_text = format!("\n\n{error_marker}");
	let body = stream.frames.map(move |frame| {
		let chunk = match frame {
			StreamFrame::Token(text) | StreamFrame::Footer(text) => text,
			StreamFrame::Error(_) => error_text.clone(),
		};

		Ok::<_, Infallible>(chunk)
	});

	(
		[
			(header::CONTENT_TYPE, "text/event-stream"),
			(header::CACHE_CONTROL, "no-cache"),
			(HeaderName::from_static(SOURCE_TYPE_HEADER), stream.source_type.as_str()),
		],
		Body::from_stream(body),
	)
		.into_response()
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}

	/// Malformed bodies are validation errors. The extractor's own text is not exposed.
	fn from_rejection(rejection: JsonRejection) -> Self {
		tracing::warn!(error = %rejection.body_text(), "Rejected request body.");

		Self::new(StatusCode::BAD_REQUEST, INVALID_BODY)
	}

	/// Validation messages reach the client. Provider detail stays in the logs.
	fn from_service(err: Error, failure_message: &str) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			Error::Provider { .. } | Error::StreamInterrupted { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure_message),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
