use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use sift_service::{Error, RetrieveRequest, RetrieveResponse};

use crate::state::AppState;

const RETRIEVE_PATH: &str = "/api/v1/retrieve";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
	pub name: &'static str,
	pub version: &'static str,
	pub status: &'static str,
	pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
	pub retrieve: &'static str,
	pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
	pub status: &'static str,
	/// Unix seconds with a fractional part.
	pub timestamp: f64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { field, message } => Self::new(
				StatusCode::UNPROCESSABLE_ENTITY,
				"INVALID_REQUEST",
				format!("{field} {message}"),
				Some(vec![format!("$.{field}")]),
			),
			other => {
				tracing::error!(error = %other, "Retrieve request failed outside the pipeline.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", other.to_string(), None)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		let (status, error_code) = match rejection {
			JsonRejection::JsonDataError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST"),
			_ => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
		};

		Self::new(status, error_code, rejection.body_text(), None)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(root))
		.route(HEALTH_PATH, get(health))
		.route(RETRIEVE_PATH, post(retrieve))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn root() -> Json<ServiceInfo> {
	Json(ServiceInfo {
		name: "sift",
		version: crate::VERSION,
		status: "running",
		endpoints: Endpoints { retrieve: RETRIEVE_PATH, health: HEALTH_PATH },
	})
}

async fn health() -> Json<Health> {
	let now = time::OffsetDateTime::now_utc();

	Json(Health { status: "healthy", timestamp: now.unix_timestamp_nanos() as f64 / 1e9 })
}

async fn retrieve(
	State(state): State<AppState>,
	payload: Result<Json<RetrieveRequest>, JsonRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
	let Json(request) = payload?;
	let response = state.service.retrieve(request).await?;

	Ok(Json(response))
}
