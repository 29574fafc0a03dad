//! Customer account types.
//!
//! A customer is the clinician account that owns treatment requests. Only the
//! fields the portal itself needs are modeled here; authentication and session
//! handling live outside this service.

use serde::{Deserialize, Serialize};

/// Standing clinical preferences a clinician configures once and the planning
/// team applies to every case. Values are the option keys from the
/// preferences form, kept as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalPreferences {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub passive_aligners: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delay_ipr_stage: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_ipr: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delay_attachment_stage: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub incisal_leveling: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub elastic_chain: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distalization_options: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub elastic_positions: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub special_instructions: Option<String>,
}

/// A clinician account that owns treatment requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
	pub id: String,
	pub name: String,
	/// Destination for status-update notifications. May be empty for accounts
	/// imported without one; the notifier logs and skips in that case.
	pub email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub clinical_preferences: Option<ClinicalPreferences>,
}

/// Payload for registering a customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
	pub name: String,
	pub email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub clinical_preferences: Option<ClinicalPreferences>,
}
