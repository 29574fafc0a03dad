//! Treatment request types for the portal system.
//!
//! This module defines the persisted request record, its status enums with
//! their customer-facing Portuguese labels, the prescription field block
//! collected by the clinician form, and the write models (new request and
//! patch) accepted by the lifecycle engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// FDI codes for the upper arch (first and second quadrants, up to the
/// second molar on the left side).
pub const UPPER_ARCH_TEETH: [&str; 15] = [
	"11", "12", "13", "14", "15", "16", "17", "18", "21", "22", "23", "24", "25", "26", "27",
];

/// FDI codes for the lower arch (third and fourth quadrants).
pub const LOWER_ARCH_TEETH: [&str; 15] = [
	"31", "32", "33", "34", "35", "36", "37", "38", "41", "42", "43", "44", "45", "46", "47",
];

/// Lifecycle status of a treatment request.
///
/// Requests move documentation_check -> in_progress -> completed. Values not
/// recognized on deserialization collapse into `Unknown` so that a record
/// written by a newer revision still loads and lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
	/// Submitted documents are being checked.
	DocumentationCheck,
	/// Virtual planning is underway.
	InProgress,
	/// The case has been finalized and an order id assigned.
	Completed,
	/// Any serialized value this revision does not recognize.
	#[serde(other)]
	Unknown,
}

impl RequestStatus {
	/// Customer-facing label shown in listings and notifications.
	pub fn label(&self) -> &'static str {
		match self {
			RequestStatus::DocumentationCheck => "Verificando documentação",
			RequestStatus::InProgress => "Em andamento",
			RequestStatus::Completed => "Caso finalizado",
			RequestStatus::Unknown => "Status não definido",
		}
	}
}

impl Default for RequestStatus {
	fn default() -> Self {
		RequestStatus::DocumentationCheck
	}
}

impl fmt::Display for RequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequestStatus::DocumentationCheck => write!(f, "documentation_check"),
			RequestStatus::InProgress => write!(f, "in_progress"),
			RequestStatus::Completed => write!(f, "completed"),
			RequestStatus::Unknown => write!(f, "unknown"),
		}
	}
}

/// Payment sub-state, independent of the main request status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	NotPaid,
	Paid,
}

impl PaymentStatus {
	pub fn label(&self) -> &'static str {
		match self {
			PaymentStatus::NotPaid => "Não Pago",
			PaymentStatus::Paid => "Pago",
		}
	}
}

impl Default for PaymentStatus {
	fn default() -> Self {
		PaymentStatus::NotPaid
	}
}

/// Shipment sub-state for the produced aligners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
	NotSent,
	Preparing,
	Sent,
	Delivered,
}

impl TrackingStatus {
	pub fn label(&self) -> &'static str {
		match self {
			TrackingStatus::NotSent => "Não enviado",
			TrackingStatus::Preparing => "Preparando envio",
			TrackingStatus::Sent => "Enviado",
			TrackingStatus::Delivered => "Entregue",
		}
	}
}

impl Default for TrackingStatus {
	fn default() -> Self {
		TrackingStatus::NotSent
	}
}

/// Payment details attached to a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
	#[serde(default)]
	pub status: PaymentStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pix_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub card_url: Option<String>,
}

/// Shipment details attached to a completed, paid request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
	#[serde(default)]
	pub status: TrackingStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub carrier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sent_date: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Reference to a stored media file (the storage backend itself is external).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
	/// Identifier in the media store.
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

/// A named document slot on a request, optionally carrying a file reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub document_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub document_file: Option<MediaRef>,
}

/// Which arch the treatment covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchToTreat {
	None,
	Both,
	Upper,
	Lower,
}

impl ArchToTreat {
	/// Whether the upper arch is part of the treatment.
	pub fn includes_upper(&self) -> bool {
		matches!(self, ArchToTreat::Upper | ArchToTreat::Both)
	}

	/// Whether the lower arch is part of the treatment.
	pub fn includes_lower(&self) -> bool {
		matches!(self, ArchToTreat::Lower | ArchToTreat::Both)
	}
}

/// Antero-posterior relation correction to pursue on an arch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApRelation {
	ImproveCanine,
	ImproveCanineAndMolar,
	ImproveMolar,
	None,
}

impl Default for ApRelation {
	fn default() -> Self {
		ApRelation::None
	}
}

/// Side selection for an elastic or button cutout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CutoutSide {
	Right,
	Left,
	Both,
	None,
}

impl Default for CutoutSide {
	fn default() -> Self {
		CutoutSide::None
	}
}

/// Cutouts for elastics or button bonding, per tooth group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElasticCutouts {
	#[serde(default)]
	pub canine_elastic: CutoutSide,
	#[serde(default)]
	pub canine_button: CutoutSide,
	#[serde(default)]
	pub molar_elastic: CutoutSide,
	#[serde(default)]
	pub molar_button: CutoutSide,
}

/// Plain yes/no selections from the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
	Yes,
	No,
}

/// Interproximal reduction instruction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformIpr {
	/// As needed, up to the standard 0.5mm limit.
	Yes,
	No,
	/// Regions and amounts described in `ipr_details`.
	DetailBelow,
}

/// The clinical prescription block collected by the treatment request form.
///
/// Field meanings follow the form: tooth lists carry FDI codes, conditional
/// fields are only meaningful when their governing selection enables them
/// (enforced by the prescription rule set, not by the type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
	pub arch_to_treat: ArchToTreat,
	#[serde(default)]
	pub upper_jaw_movement_restriction: Vec<String>,
	#[serde(default)]
	pub lower_jaw_movement_restriction: Vec<String>,
	#[serde(default)]
	pub ap_relation_upper: ApRelation,
	#[serde(default)]
	pub ap_relation_lower: ApRelation,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distalization_instructions: Option<String>,
	#[serde(default)]
	pub elastic_cutouts: ElasticCutouts,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub elastic_cutout_instructions: Option<String>,
	pub use_attachments: YesNo,
	#[serde(default)]
	pub upper_jaw_no_attachments: Vec<String>,
	#[serde(default)]
	pub lower_jaw_no_attachments: Vec<String>,
	pub perform_ipr: PerformIpr,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ipr_details: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub diastema_instructions: Option<String>,
	pub general_instructions: String,
	pub send_whatsapp_link: YesNo,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub whatsapp_number: Option<String>,
}

/// A persisted treatment request.
///
/// Created from a validated submission and mutated only through the lifecycle
/// engine, which maintains the derived fields (`public_id`, `order_id`,
/// `completion_date`, `title_for_list`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	/// Internal identifier.
	pub id: String,
	/// Stable external identifier used in URLs; assigned once at creation.
	pub public_id: String,
	/// Id of the owning customer account.
	pub customer: String,
	/// Patient name.
	pub patient: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_info: Option<String>,
	#[serde(default)]
	pub documents: Vec<Document>,
	#[serde(flatten)]
	pub prescription: Prescription,
	#[serde(default)]
	pub status: RequestStatus,
	/// Sequential identifier, assigned once on the first transition to completed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_id: Option<u64>,
	/// Set once, at the same transition that assigns `order_id`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completion_date: Option<DateTime<Utc>>,
	/// External link to the virtual planning; setting it forces in_progress.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_link: Option<String>,
	#[serde(default)]
	pub payment: PaymentInfo,
	#[serde(default)]
	pub tracking: TrackingInfo,
	/// Derived display title, recomputed on every write.
	pub title_for_list: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Builds the derived listing title from patient name and status.
pub fn title_for_list(patient: &str, status: RequestStatus) -> String {
	format!("{} - [{}]", patient, status.label())
}

/// A new treatment request submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
	pub customer: String,
	pub patient: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_info: Option<String>,
	#[serde(default)]
	pub documents: Vec<Document>,
	#[serde(flatten)]
	pub prescription: Prescription,
}

/// A partial update to an existing request.
///
/// Absent fields leave the stored value untouched. `public_id`, `order_id`
/// and `completion_date` are not patchable; the engine owns them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub patient: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_info: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub documents: Option<Vec<Document>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prescription: Option<Prescription>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<RequestStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_link: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking: Option<TrackingInfo>,
}

/// Listing row for a customer's requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
	pub public_id: String,
	pub patient: String,
	pub status: RequestStatus,
	pub created_at: DateTime<Utc>,
}

/// Per-status request counts for the dashboard widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
	pub documentation_check: u64,
	pub in_progress: u64,
	pub completed: u64,
}
