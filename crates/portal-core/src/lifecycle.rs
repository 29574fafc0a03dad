//! Request transition rules.
//!
//! Pure functions that take the stored record and an incoming write and
//! produce the record to persist plus the change flags the post-write side
//! effects depend on. Storage access and order-id allocation stay in the
//! engine; everything here is deterministic and unit-testable.

use chrono::{DateTime, Utc};
use portal_types::{title_for_list, NewRequest, Request, RequestPatch, RequestStatus};

/// What changed in an update, from the point of view of the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFlags {
	pub status: bool,
	pub payment_status: bool,
	pub tracking_status: bool,
	pub tracking_link: bool,
}

impl ChangeFlags {
	/// Whether any customer-visible state changed.
	pub fn any(&self) -> bool {
		self.status || self.payment_status || self.tracking_status || self.tracking_link
	}
}

/// Result of merging a patch into a stored record.
#[derive(Debug)]
pub struct UpdateOutcome {
	/// The merged record, ready to persist once an order id has been
	/// assigned (when `needs_order_id` is set).
	pub request: Request,
	pub changes: ChangeFlags,
	/// Set when this write is the first transition into completed and the
	/// engine must allocate the next order id before persisting.
	pub needs_order_id: bool,
}

/// Builds the initial record for a new submission.
///
/// The caller supplies fresh identifiers; order id and completion date are
/// never accepted from a submission and start unset.
pub fn apply_create(
	id: String,
	public_id: String,
	submission: NewRequest,
	now: DateTime<Utc>,
) -> Request {
	let status = RequestStatus::default();
	let title = title_for_list(&submission.patient, status);

	Request {
		id,
		public_id,
		customer: submission.customer,
		patient: submission.patient,
		additional_info: submission.additional_info,
		documents: submission.documents,
		prescription: submission.prescription,
		status,
		order_id: None,
		completion_date: None,
		tracking_link: None,
		payment: Default::default(),
		tracking: Default::default(),
		title_for_list: title,
		created_at: now,
		updated_at: now,
	}
}

/// Merges a patch into the stored record and applies the transition rules.
///
/// - identifiers, customer, created_at and the assigned order id and
///   completion date are immutable
/// - adding or changing the tracking link forces in_progress, overriding
///   any status submitted in the same write
/// - the first transition into completed requests an order id and stamps
///   the completion date
/// - the listing title is recomputed from the final patient and status
pub fn apply_update(current: &Request, patch: RequestPatch, now: DateTime<Utc>) -> UpdateOutcome {
	let mut next = current.clone();

	if let Some(patient) = patch.patient {
		next.patient = patient;
	}
	if let Some(info) = patch.additional_info {
		next.additional_info = Some(info);
	}
	if let Some(documents) = patch.documents {
		next.documents = documents;
	}
	if let Some(prescription) = patch.prescription {
		next.prescription = prescription;
	}
	if let Some(payment) = patch.payment {
		next.payment = payment;
	}
	if let Some(tracking) = patch.tracking {
		next.tracking = tracking;
	}
	if let Some(status) = patch.status {
		next.status = status;
	}

	let tracking_link_changed = match &patch.tracking_link {
		Some(link) => current.tracking_link.as_deref() != Some(link.as_str()),
		None => false,
	};
	if let Some(link) = patch.tracking_link {
		next.tracking_link = Some(link);
	}
	if tracking_link_changed {
		next.status = RequestStatus::InProgress;
	}

	let mut needs_order_id = false;
	if next.status == RequestStatus::Completed
		&& current.status != RequestStatus::Completed
		&& current.order_id.is_none()
	{
		needs_order_id = true;
		if next.completion_date.is_none() {
			next.completion_date = Some(now);
		}
	}

	next.title_for_list = title_for_list(&next.patient, next.status);
	next.updated_at = now;

	let changes = ChangeFlags {
		status: next.status != current.status,
		payment_status: next.payment.status != current.payment.status,
		tracking_status: next.tracking.status != current.tracking.status,
		tracking_link: tracking_link_changed,
	};

	UpdateOutcome {
		request: next,
		changes,
		needs_order_id,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use portal_types::{
		ApRelation, ArchToTreat, ElasticCutouts, PaymentStatus, PerformIpr, Prescription,
		TrackingStatus, YesNo,
	};

	fn prescription() -> Prescription {
		Prescription {
			arch_to_treat: ArchToTreat::Both,
			upper_jaw_movement_restriction: vec!["11".to_string()],
			lower_jaw_movement_restriction: vec!["31".to_string()],
			ap_relation_upper: ApRelation::None,
			ap_relation_lower: ApRelation::None,
			distalization_instructions: None,
			elastic_cutouts: ElasticCutouts::default(),
			elastic_cutout_instructions: None,
			use_attachments: YesNo::Yes,
			upper_jaw_no_attachments: vec![],
			lower_jaw_no_attachments: vec![],
			perform_ipr: PerformIpr::No,
			ipr_details: None,
			diastema_instructions: None,
			general_instructions: "Alinhar".to_string(),
			send_whatsapp_link: YesNo::No,
			whatsapp_number: None,
		}
	}

	fn submission() -> NewRequest {
		NewRequest {
			customer: "c1".to_string(),
			patient: "Maria Souza".to_string(),
			additional_info: None,
			documents: vec![],
			prescription: prescription(),
		}
	}

	fn stored() -> Request {
		apply_create(
			"r1".to_string(),
			"3c6e0b8a-9c15-4b8a-b8f0-000000000001".to_string(),
			submission(),
			Utc::now(),
		)
	}

	#[test]
	fn create_starts_in_documentation_check() {
		let request = stored();
		assert_eq!(request.status, RequestStatus::DocumentationCheck);
		assert_eq!(request.order_id, None);
		assert_eq!(request.completion_date, None);
		assert_eq!(
			request.title_for_list,
			"Maria Souza - [Verificando documentação]"
		);
	}

	#[test]
	fn first_completion_requests_an_order_id_and_stamps_the_date() {
		let current = stored();
		let now = Utc::now();
		let outcome = apply_update(
			&current,
			RequestPatch {
				status: Some(RequestStatus::Completed),
				..Default::default()
			},
			now,
		);
		assert!(outcome.needs_order_id);
		assert_eq!(outcome.request.completion_date, Some(now));
		assert!(outcome.changes.status);
		assert_eq!(
			outcome.request.title_for_list,
			"Maria Souza - [Caso finalizado]"
		);
	}

	#[test]
	fn repeated_completion_allocates_nothing() {
		let mut current = stored();
		current.status = RequestStatus::Completed;
		current.order_id = Some(203);
		let completed_at = current.updated_at;
		current.completion_date = Some(completed_at);

		let outcome = apply_update(
			&current,
			RequestPatch {
				status: Some(RequestStatus::Completed),
				..Default::default()
			},
			Utc::now(),
		);
		assert!(!outcome.needs_order_id);
		assert_eq!(outcome.request.order_id, Some(203));
		assert_eq!(outcome.request.completion_date, Some(completed_at));
		assert!(!outcome.changes.status);
	}

	#[test]
	fn tracking_link_forces_in_progress_over_submitted_status() {
		let current = stored();
		let outcome = apply_update(
			&current,
			RequestPatch {
				status: Some(RequestStatus::Completed),
				tracking_link: Some("https://planning.example/42".to_string()),
				..Default::default()
			},
			Utc::now(),
		);
		assert_eq!(outcome.request.status, RequestStatus::InProgress);
		assert!(outcome.changes.tracking_link);
		assert!(!outcome.needs_order_id);
	}

	#[test]
	fn resubmitting_the_same_tracking_link_changes_nothing() {
		let mut current = stored();
		current.tracking_link = Some("https://planning.example/42".to_string());
		current.status = RequestStatus::Completed;
		current.order_id = Some(200);

		let outcome = apply_update(
			&current,
			RequestPatch {
				tracking_link: Some("https://planning.example/42".to_string()),
				..Default::default()
			},
			Utc::now(),
		);
		// An unchanged link does not force in_progress
		assert_eq!(outcome.request.status, RequestStatus::Completed);
		assert!(!outcome.changes.any());
	}

	#[test]
	fn payment_and_tracking_changes_are_flagged() {
		let current = stored();
		let mut payment = current.payment.clone();
		payment.status = PaymentStatus::Paid;
		let mut tracking = current.tracking.clone();
		tracking.status = TrackingStatus::Preparing;

		let outcome = apply_update(
			&current,
			RequestPatch {
				payment: Some(payment),
				tracking: Some(tracking),
				..Default::default()
			},
			Utc::now(),
		);
		assert!(outcome.changes.payment_status);
		assert!(outcome.changes.tracking_status);
		assert!(!outcome.changes.status);
	}

	#[test]
	fn title_follows_patient_rename() {
		let current = stored();
		let outcome = apply_update(
			&current,
			RequestPatch {
				patient: Some("Ana Lima".to_string()),
				..Default::default()
			},
			Utc::now(),
		);
		assert_eq!(
			outcome.request.title_for_list,
			"Ana Lima - [Verificando documentação]"
		);
	}

	#[test]
	fn immutable_fields_survive_updates() {
		let current = stored();
		let outcome = apply_update(
			&current,
			RequestPatch {
				status: Some(RequestStatus::InProgress),
				..Default::default()
			},
			Utc::now(),
		);
		assert_eq!(outcome.request.public_id, current.public_id);
		assert_eq!(outcome.request.customer, current.customer);
		assert_eq!(outcome.request.created_at, current.created_at);
	}
}
