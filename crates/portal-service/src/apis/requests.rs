//! Treatment request endpoints.
//!
//! Create, fetch, patch, list and count treatment requests. Public ids are
//! UUIDs; malformed ids are rejected before the engine is consulted.

use crate::apis::map_portal_error;
use portal_core::PortalEngine;
use portal_types::{
	ApiError, NewRequest, Request, RequestPatch, RequestSummary, StatusCounts,
};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
	/// Owning customer id.
	pub customer: String,
	/// 1-based page number.
	pub page: Option<usize>,
	/// Page size, capped at 100.
	pub limit: Option<usize>,
}

const DEFAULT_PAGE_LIMIT: usize = 20;
const MAX_PAGE_LIMIT: usize = 100;

fn validate_public_id(public_id: &str) -> Result<(), ApiError> {
	if Uuid::parse_str(public_id).is_err() {
		return Err(ApiError::BadRequest {
			error_type: "INVALID_REQUEST_ID".to_string(),
			message: format!("Request ID must be a valid UUID: {}", public_id),
			details: None,
		});
	}
	Ok(())
}

/// Processes POST /api/requests.
pub async fn create_request(
	engine: &PortalEngine,
	submission: NewRequest,
) -> Result<Request, ApiError> {
	engine
		.create_request(submission)
		.await
		.map_err(map_portal_error)
}

/// Processes GET /api/requests/{public_id}.
pub async fn get_request(engine: &PortalEngine, public_id: &str) -> Result<Request, ApiError> {
	validate_public_id(public_id)?;
	engine
		.get_request(public_id)
		.await
		.map_err(map_portal_error)
}

/// Processes PATCH /api/requests/{public_id}.
pub async fn update_request(
	engine: &PortalEngine,
	public_id: &str,
	patch: RequestPatch,
) -> Result<Request, ApiError> {
	validate_public_id(public_id)?;
	engine
		.update_request(public_id, patch)
		.await
		.map_err(map_portal_error)
}

/// Processes GET /api/requests.
pub async fn list_requests(
	engine: &PortalEngine,
	query: ListQuery,
) -> Result<Vec<RequestSummary>, ApiError> {
	let page = query.page.unwrap_or(1).max(1);
	let limit = query
		.limit
		.unwrap_or(DEFAULT_PAGE_LIMIT)
		.clamp(1, MAX_PAGE_LIMIT);
	engine
		.list_requests(&query.customer, page, limit)
		.await
		.map_err(map_portal_error)
}

/// Processes GET /api/requests/status-counts.
pub async fn status_counts(
	engine: &PortalEngine,
	customer: &str,
) -> Result<StatusCounts, ApiError> {
	engine
		.status_counts(customer)
		.await
		.map_err(map_portal_error)
}
