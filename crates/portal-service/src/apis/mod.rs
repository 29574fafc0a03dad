//! Endpoint implementations for the portal HTTP API.

pub mod customers;
pub mod requests;

use portal_core::PortalError;
use portal_types::ApiError;

/// Maps engine errors onto the shared API error shape.
pub fn map_portal_error(e: PortalError) -> ApiError {
	match e {
		PortalError::Validation(violations) => ApiError::UnprocessableEntity {
			error_type: "VALIDATION_FAILED".to_string(),
			message: violations.to_string(),
			details: serde_json::to_value(&violations.issues).ok(),
		},
		PortalError::NotFound(what) => ApiError::NotFound {
			error_type: "NOT_FOUND".to_string(),
			message: format!("Not found: {}", what),
		},
		PortalError::Config(message) => ApiError::InternalServerError {
			error_type: "CONFIGURATION_ERROR".to_string(),
			message,
		},
		PortalError::Storage(e) => ApiError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message: e.to_string(),
		},
	}
}
