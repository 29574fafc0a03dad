//! HTTP server for the portal API.
//!
//! Builds the axum router for the request and customer endpoints and runs
//! it with the CORS and body-size policies from configuration.

use axum::{
	extract::{Path, Query, State},
	http::{HeaderValue, Method},
	response::Json,
	routing::{get, post},
	Router,
};
use portal_config::{ApiConfig, CorsConfig};
use portal_core::PortalEngine;
use portal_types::{
	ApiError, Customer, NewCustomer, NewRequest, Request, RequestPatch, RequestSummary,
	StatusCounts,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the lifecycle engine for processing requests.
	pub engine: Arc<PortalEngine>,
}

/// Builds the application router.
pub fn build_router(engine: Arc<PortalEngine>, api_config: &ApiConfig) -> Router {
	let cors = cors_layer(api_config.cors.as_ref());

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route(
					"/requests",
					post(handle_create_request).get(handle_list_requests),
				)
				.route("/requests/status-counts", get(handle_status_counts))
				.route(
					"/requests/{public_id}",
					get(handle_get_request).patch(handle_update_request),
				)
				.route("/customers", post(handle_create_customer))
				.route("/customers/{id}", get(handle_get_customer)),
		)
		.layer(RequestBodyLimitLayer::new(api_config.max_request_size))
		.layer(cors)
		.with_state(AppState { engine })
}

/// Builds the CORS layer from configuration; permissive when unset.
fn cors_layer(config: Option<&CorsConfig>) -> CorsLayer {
	match config {
		Some(cors) => {
			let origins: Vec<HeaderValue> = cors
				.allowed_origins
				.iter()
				.filter_map(|o| o.parse().ok())
				.collect();
			let methods: Vec<Method> = cors
				.allowed_methods
				.iter()
				.filter_map(|m| m.parse().ok())
				.collect();
			let headers: Vec<axum::http::HeaderName> = cors
				.allowed_headers
				.iter()
				.filter_map(|h| h.parse().ok())
				.collect();
			CorsLayer::new()
				.allow_origin(origins)
				.allow_methods(methods)
				.allow_headers(headers)
		},
		None => CorsLayer::permissive(),
	}
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<PortalEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(engine, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Portal API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/requests.
async fn handle_create_request(
	State(state): State<AppState>,
	Json(submission): Json<NewRequest>,
) -> Result<Json<Request>, ApiError> {
	match crate::apis::requests::create_request(&state.engine, submission).await {
		Ok(request) => Ok(Json(request)),
		Err(e) => {
			tracing::warn!("Request creation failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/requests/{public_id}.
async fn handle_get_request(
	Path(public_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Request>, ApiError> {
	match crate::apis::requests::get_request(&state.engine, &public_id).await {
		Ok(request) => Ok(Json(request)),
		Err(e) => {
			tracing::warn!("Request retrieval failed: {}", e);
			Err(e)
		},
	}
}

/// Handles PATCH /api/requests/{public_id}.
async fn handle_update_request(
	Path(public_id): Path<String>,
	State(state): State<AppState>,
	Json(patch): Json<RequestPatch>,
) -> Result<Json<Request>, ApiError> {
	match crate::apis::requests::update_request(&state.engine, &public_id, patch).await {
		Ok(request) => Ok(Json(request)),
		Err(e) => {
			tracing::warn!("Request update failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/requests.
async fn handle_list_requests(
	Query(query): Query<crate::apis::requests::ListQuery>,
	State(state): State<AppState>,
) -> Result<Json<Vec<RequestSummary>>, ApiError> {
	match crate::apis::requests::list_requests(&state.engine, query).await {
		Ok(summaries) => Ok(Json(summaries)),
		Err(e) => {
			tracing::warn!("Request listing failed: {}", e);
			Err(e)
		},
	}
}

/// Query parameters for the status-counts endpoint.
#[derive(Debug, Deserialize)]
struct CountsQuery {
	customer: String,
}

/// Handles GET /api/requests/status-counts.
async fn handle_status_counts(
	Query(query): Query<CountsQuery>,
	State(state): State<AppState>,
) -> Result<Json<StatusCounts>, ApiError> {
	match crate::apis::requests::status_counts(&state.engine, &query.customer).await {
		Ok(counts) => Ok(Json(counts)),
		Err(e) => {
			tracing::warn!("Status counting failed: {}", e);
			Err(e)
		},
	}
}

/// Handles POST /api/customers.
async fn handle_create_customer(
	State(state): State<AppState>,
	Json(new): Json<NewCustomer>,
) -> Result<Json<Customer>, ApiError> {
	match crate::apis::customers::create_customer(&state.engine, new).await {
		Ok(customer) => Ok(Json(customer)),
		Err(e) => {
			tracing::warn!("Customer creation failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/customers/{id}.
async fn handle_get_customer(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Customer>, ApiError> {
	match crate::apis::customers::get_customer(&state.engine, &id).await {
		Ok(customer) => Ok(Json(customer)),
		Err(e) => {
			tracing::warn!("Customer retrieval failed: {}", e);
			Err(e)
		},
	}
}
