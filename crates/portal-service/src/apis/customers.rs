//! Customer account endpoints.

use crate::apis::map_portal_error;
use portal_core::PortalEngine;
use portal_types::{ApiError, Customer, NewCustomer};

/// Processes POST /api/customers.
pub async fn create_customer(
	engine: &PortalEngine,
	new: NewCustomer,
) -> Result<Customer, ApiError> {
	if new.name.trim().is_empty() {
		return Err(ApiError::BadRequest {
			error_type: "INVALID_CUSTOMER".to_string(),
			message: "Customer name cannot be empty".to_string(),
			details: None,
		});
	}
	engine.create_customer(new).await.map_err(map_portal_error)
}

/// Processes GET /api/customers/{id}.
pub async fn get_customer(engine: &PortalEngine, id: &str) -> Result<Customer, ApiError> {
	engine.get_customer(id).await.map_err(map_portal_error)
}
