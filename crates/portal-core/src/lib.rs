//! Core lifecycle engine for the portal system.
//!
//! This module orchestrates treatment request writes: validation through the
//! prescription rule set, the transition rules, order-id sequencing, and the
//! post-write side effects (cache revalidation and customer notification).
//! It also provides the builder that assembles an engine from configuration
//! and the registered backend factories.

use chrono::Utc;
use portal_config::Config;
use portal_notify::{NotificationService, NotifierFactory};
use portal_prescription::{RuleViolations, ValidationMode};
use portal_revalidate::{RevalidationFactory, RevalidationService};
use portal_storage::{StorageError, StorageFactory, StorageService};
use portal_types::{
	Customer, NewCustomer, NewRequest, Request, RequestPatch, RequestStatus, RequestSummary,
	StatusCounts, StorageKey,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

pub mod lifecycle;
pub mod sequence;

use lifecycle::ChangeFlags;
use sequence::OrderIdAllocator;

/// Errors that can occur during portal operations.
#[derive(Debug, Error)]
pub enum PortalError {
	/// Error related to configuration issues.
	#[error("Configuration error: {0}")]
	Config(String),
	/// The submission violated the prescription rule set.
	#[error(transparent)]
	Validation(#[from] RuleViolations),
	/// The referenced record does not exist.
	#[error("Not found: {0}")]
	NotFound(String),
	/// Error from the storage backend.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Main engine coordinating request lifecycle operations.
///
/// Writes go through three phases: rule validation, the pure transition
/// rules in [`lifecycle`], and persistence. Side effects run after the
/// write and never fail it.
pub struct PortalEngine {
	storage: Arc<StorageService>,
	notifier: Arc<NotificationService>,
	revalidation: Arc<RevalidationService>,
	order_ids: OrderIdAllocator,
	/// Paths invalidated after every write.
	revalidate_paths: Vec<String>,
	/// Base path of the request detail pages.
	listing_path: String,
}

impl PortalEngine {
	/// Creates an engine from already-constructed services.
	pub fn new(
		config: &Config,
		storage: Arc<StorageService>,
		notifier: Arc<NotificationService>,
		revalidation: Arc<RevalidationService>,
	) -> Self {
		Self {
			storage,
			notifier,
			revalidation,
			order_ids: OrderIdAllocator::new(),
			revalidate_paths: config.revalidate.paths.clone(),
			listing_path: config.revalidate.listing_path.clone(),
		}
	}

	/// Registers a customer account.
	pub async fn create_customer(&self, new: NewCustomer) -> Result<Customer, PortalError> {
		let customer = Customer {
			id: uuid::Uuid::new_v4().to_string(),
			name: new.name,
			email: new.email,
			phone: new.phone,
			clinical_preferences: new.clinical_preferences,
		};
		self.storage
			.store(StorageKey::Customers.as_str(), &customer.id, &customer)
			.await?;
		Ok(customer)
	}

	/// Fetches a customer account by id.
	pub async fn get_customer(&self, id: &str) -> Result<Customer, PortalError> {
		self.storage
			.retrieve(StorageKey::Customers.as_str(), id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => PortalError::NotFound(format!("customer {}", id)),
				other => PortalError::Storage(other),
			})
	}

	/// Creates a treatment request from a validated submission.
	pub async fn create_request(&self, submission: NewRequest) -> Result<Request, PortalError> {
		// The owning account must exist before anything is persisted.
		self.get_customer(&submission.customer).await?;

		portal_prescription::validate(
			&submission.patient,
			&submission.documents,
			&submission.prescription,
			None,
			ValidationMode::Create,
		)?;

		let request = lifecycle::apply_create(
			uuid::Uuid::new_v4().to_string(),
			uuid::Uuid::new_v4().to_string(),
			submission,
			Utc::now(),
		);

		self.storage
			.store(StorageKey::Requests.as_str(), &request.public_id, &request)
			.await?;

		// Creation changes the listings but notifies nobody.
		self.run_post_write(&request, ChangeFlags::default(), false)
			.await;

		Ok(request)
	}

	/// Applies a partial update to an existing request.
	pub async fn update_request(
		&self,
		public_id: &str,
		patch: RequestPatch,
	) -> Result<Request, PortalError> {
		let current = self.get_request(public_id).await?;
		let mut outcome = lifecycle::apply_update(&current, patch, Utc::now());

		portal_prescription::validate(
			&outcome.request.patient,
			&outcome.request.documents,
			&outcome.request.prescription,
			outcome.request.tracking_link.as_deref(),
			ValidationMode::Update,
		)?;

		if outcome.needs_order_id {
			let stored_max = self.max_assigned_order_id().await?;
			outcome.request.order_id = Some(self.order_ids.allocate(stored_max).await);
		}

		self.storage
			.update(StorageKey::Requests.as_str(), public_id, &outcome.request)
			.await?;

		self.run_post_write(&outcome.request, outcome.changes, true)
			.await;

		Ok(outcome.request)
	}

	/// Fetches a request by its public id.
	pub async fn get_request(&self, public_id: &str) -> Result<Request, PortalError> {
		self.storage
			.retrieve(StorageKey::Requests.as_str(), public_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => PortalError::NotFound(format!("request {}", public_id)),
				other => PortalError::Storage(other),
			})
	}

	/// Lists a customer's requests as summaries, newest first.
	///
	/// Pages are 1-based; a page past the end is empty, not an error.
	pub async fn list_requests(
		&self,
		customer: &str,
		page: usize,
		limit: usize,
	) -> Result<Vec<RequestSummary>, PortalError> {
		let mut requests = self.requests_of(customer).await?;
		requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let page = page.max(1);
		let start = (page - 1).saturating_mul(limit);
		Ok(requests
			.into_iter()
			.skip(start)
			.take(limit)
			.map(|r| RequestSummary {
				public_id: r.public_id,
				patient: r.patient,
				status: r.status,
				created_at: r.created_at,
			})
			.collect())
	}

	/// Counts a customer's requests per lifecycle status.
	pub async fn status_counts(&self, customer: &str) -> Result<StatusCounts, PortalError> {
		let mut counts = StatusCounts::default();
		for request in self.requests_of(customer).await? {
			match request.status {
				RequestStatus::DocumentationCheck => counts.documentation_check += 1,
				RequestStatus::InProgress => counts.in_progress += 1,
				RequestStatus::Completed => counts.completed += 1,
				RequestStatus::Unknown => {},
			}
		}
		Ok(counts)
	}

	async fn requests_of(&self, customer: &str) -> Result<Vec<Request>, PortalError> {
		let all: Vec<Request> = self
			.storage
			.retrieve_all(StorageKey::Requests.as_str())
			.await?;
		Ok(all.into_iter().filter(|r| r.customer == customer).collect())
	}

	/// Highest order id assigned so far, across all customers.
	async fn max_assigned_order_id(&self) -> Result<Option<u64>, PortalError> {
		let all: Vec<Request> = self
			.storage
			.retrieve_all(StorageKey::Requests.as_str())
			.await?;
		Ok(all.iter().filter_map(|r| r.order_id).max())
	}

	/// Post-write side effects: cache revalidation and, for updates with a
	/// customer-visible change, one status-update notification. Best effort;
	/// failures are logged and never propagated to the finished write.
	async fn run_post_write(&self, request: &Request, changes: ChangeFlags, is_update: bool) {
		let mut paths = self.revalidate_paths.clone();
		paths.push(format!(
			"{}/{}",
			self.listing_path.trim_end_matches('/'),
			request.public_id
		));
		self.revalidation.invalidate_paths(&paths).await;

		// A transition into completed sends nothing here; completion is
		// announced by the separate approval flow.
		let should_notify =
			is_update && changes.any() && request.status != RequestStatus::Completed;
		if !should_notify {
			return;
		}

		let customer: Customer = match self
			.storage
			.retrieve(StorageKey::Customers.as_str(), &request.customer)
			.await
		{
			Ok(customer) => customer,
			Err(e) => {
				warn!(
					customer = %request.customer,
					error = %e,
					"skipping notification, owning customer could not be loaded"
				);
				return;
			},
		};

		if customer.email.is_empty() {
			warn!(
				customer = %customer.id,
				"skipping notification, customer has no email"
			);
			return;
		}

		if let Err(e) = self
			.notifier
			.send_status_update(&customer.email, request)
			.await
		{
			error!(
				customer = %customer.id,
				request = %request.public_id,
				error = %e,
				"status-update notification failed"
			);
		}
	}
}

/// Builder that assembles a [`PortalEngine`] from configuration.
///
/// Backend factories are registered by name; the configuration's `primary`
/// selection picks which one each section uses. Every factory receives its
/// own TOML table, validated against the implementation's schema first.
pub struct PortalBuilder {
	storage_factories: HashMap<String, StorageFactory>,
	notifier_factories: HashMap<String, NotifierFactory>,
	revalidation_factories: HashMap<String, RevalidationFactory>,
}

impl PortalBuilder {
	pub fn new() -> Self {
		Self {
			storage_factories: HashMap::new(),
			notifier_factories: HashMap::new(),
			revalidation_factories: HashMap::new(),
		}
	}

	/// Registers a storage backend factory under a name.
	pub fn with_storage_factory(mut self, name: &str, factory: StorageFactory) -> Self {
		self.storage_factories.insert(name.to_string(), factory);
		self
	}

	/// Registers a notifier backend factory under a name.
	pub fn with_notifier_factory(mut self, name: &str, factory: NotifierFactory) -> Self {
		self.notifier_factories.insert(name.to_string(), factory);
		self
	}

	/// Registers a revalidation backend factory under a name.
	pub fn with_revalidation_factory(mut self, name: &str, factory: RevalidationFactory) -> Self {
		self.revalidation_factories
			.insert(name.to_string(), factory);
		self
	}

	/// Builds the engine, constructing each primary backend from its
	/// configured implementation table.
	pub fn build(self, config: Config) -> Result<PortalEngine, PortalError> {
		let empty = toml::Value::Table(Default::default());

		let storage_name = &config.storage.primary;
		let storage_factory = self.storage_factories.get(storage_name).ok_or_else(|| {
			PortalError::Config(format!("Unknown storage implementation: {}", storage_name))
		})?;
		let storage_config = config
			.storage
			.implementations
			.get(storage_name)
			.unwrap_or(&empty);
		let storage_backend =
			storage_factory(storage_config).map_err(|e| PortalError::Config(e.to_string()))?;
		storage_backend
			.config_schema()
			.validate(storage_config)
			.map_err(|e| PortalError::Config(e.to_string()))?;

		let notifier_name = &config.notifier.primary;
		let notifier_factory = self.notifier_factories.get(notifier_name).ok_or_else(|| {
			PortalError::Config(format!("Unknown notifier implementation: {}", notifier_name))
		})?;
		let notifier_config = config
			.notifier
			.implementations
			.get(notifier_name)
			.unwrap_or(&empty);
		let notifier_backend =
			notifier_factory(notifier_config).map_err(|e| PortalError::Config(e.to_string()))?;
		notifier_backend
			.config_schema()
			.validate(notifier_config)
			.map_err(|e| PortalError::Config(e.to_string()))?;

		let revalidation_name = &config.revalidate.primary;
		let revalidation_factory =
			self.revalidation_factories
				.get(revalidation_name)
				.ok_or_else(|| {
					PortalError::Config(format!(
						"Unknown revalidation implementation: {}",
						revalidation_name
					))
				})?;
		let revalidation_config = config
			.revalidate
			.implementations
			.get(revalidation_name)
			.unwrap_or(&empty);
		let revalidation_backend = revalidation_factory(revalidation_config)
			.map_err(|e| PortalError::Config(e.to_string()))?;
		revalidation_backend
			.config_schema()
			.validate(revalidation_config)
			.map_err(|e| PortalError::Config(e.to_string()))?;

		Ok(PortalEngine::new(
			&config,
			Arc::new(StorageService::new(storage_backend)),
			Arc::new(NotificationService::new(notifier_backend)),
			Arc::new(RevalidationService::new(revalidation_backend)),
		))
	}
}

impl Default for PortalBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use portal_notify::implementations::memory::MemoryNotifier;
	use portal_revalidate::implementations::memory::MemoryRevalidation;
	use portal_storage::implementations::memory::MemoryStorage;
	use portal_types::{
		ApRelation, ArchToTreat, Document, ElasticCutouts, MediaRef, PaymentInfo, PaymentStatus,
		PerformIpr, Prescription, YesNo,
	};

	const TEST_CONFIG: &str = r#"
[portal]
id = "test-portal"

[storage]
primary = "memory"
[storage.implementations.memory]

[notifier]
primary = "memory"
[notifier.implementations.memory]

[revalidate]
primary = "memory"
paths = ["/", "/solicitacoes"]
listing_path = "/solicitacoes"
[revalidate.implementations.memory]
"#;

	struct Harness {
		engine: PortalEngine,
		notifier: MemoryNotifier,
		revalidation: MemoryRevalidation,
	}

	fn harness() -> Harness {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let notifier = MemoryNotifier::new();
		let revalidation = MemoryRevalidation::new();
		let engine = PortalEngine::new(
			&config,
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Arc::new(NotificationService::new(Box::new(notifier.clone()))),
			Arc::new(RevalidationService::new(Box::new(revalidation.clone()))),
		);
		Harness {
			engine,
			notifier,
			revalidation,
		}
	}

	fn failing_notifier_harness() -> Harness {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let notifier = MemoryNotifier::failing();
		let revalidation = MemoryRevalidation::new();
		let engine = PortalEngine::new(
			&config,
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Arc::new(NotificationService::new(Box::new(notifier.clone()))),
			Arc::new(RevalidationService::new(Box::new(revalidation.clone()))),
		);
		Harness {
			engine,
			notifier,
			revalidation,
		}
	}

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
			general_instructions: "Alinhar e nivelar".to_string(),
			send_whatsapp_link: YesNo::No,
			whatsapp_number: None,
		}
	}

	fn documents() -> Vec<Document> {
		portal_prescription::REQUIRED_DOCUMENTS
			.iter()
			.map(|name| Document {
				document_name: name.to_string(),
				document_file: Some(MediaRef {
					id: "m1".to_string(),
					filename: None,
					url: None,
				}),
			})
			.collect()
	}

	async fn customer(engine: &PortalEngine) -> Customer {
		engine
			.create_customer(NewCustomer {
				name: "Dr. Silva".to_string(),
				email: "dr.silva@clinic.example".to_string(),
				phone: None,
				clinical_preferences: None,
			})
			.await
			.unwrap()
	}

	async fn submit(engine: &PortalEngine, customer: &Customer, patient: &str) -> Request {
		engine
			.create_request(NewRequest {
				customer: customer.id.clone(),
				patient: patient.to_string(),
				additional_info: None,
				documents: documents(),
				prescription: prescription(),
			})
			.await
			.unwrap()
	}

	fn complete() -> RequestPatch {
		RequestPatch {
			status: Some(RequestStatus::Completed),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn create_assigns_a_stable_public_id() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		assert!(!created.public_id.is_empty());
		assert_eq!(created.order_id, None);

		let updated = h
			.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					status: Some(RequestStatus::InProgress),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.public_id, created.public_id);
	}

	#[tokio::test]
	async fn create_rejects_unknown_customer() {
		let h = harness();
		let result = h
			.engine
			.create_request(NewRequest {
				customer: "nobody".to_string(),
				patient: "Maria".to_string(),
				additional_info: None,
				documents: documents(),
				prescription: prescription(),
			})
			.await;
		assert!(matches!(result, Err(PortalError::NotFound(_))));
	}

	#[tokio::test]
	async fn create_rejects_rule_violations() {
		let h = harness();
		let c = customer(&h.engine).await;
		let result = h
			.engine
			.create_request(NewRequest {
				customer: c.id,
				patient: "".to_string(),
				additional_info: None,
				documents: documents(),
				prescription: prescription(),
			})
			.await;
		match result {
			Err(PortalError::Validation(v)) => {
				assert!(v.issues.iter().any(|i| i.field == "patient"));
			},
			other => panic!("expected validation error, got {:?}", other.map(|r| r.public_id)),
		}
	}

	#[tokio::test]
	async fn first_completion_gets_order_id_200() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		let updated = h
			.engine
			.update_request(&created.public_id, complete())
			.await
			.unwrap();
		assert_eq!(updated.order_id, Some(200));
		assert!(updated.completion_date.is_some());
	}

	#[tokio::test]
	async fn order_ids_continue_from_the_stored_maximum() {
		let h = harness();
		let c = customer(&h.engine).await;
		let first = submit(&h.engine, &c, "Maria").await;
		let second = submit(&h.engine, &c, "Ana").await;

		let first = h
			.engine
			.update_request(&first.public_id, complete())
			.await
			.unwrap();
		assert_eq!(first.order_id, Some(200));

		let second = h
			.engine
			.update_request(&second.public_id, complete())
			.await
			.unwrap();
		assert_eq!(second.order_id, Some(201));

		// Completing an already completed request keeps its id
		let again = h
			.engine
			.update_request(&first.public_id, complete())
			.await
			.unwrap();
		assert_eq!(again.order_id, Some(200));
	}

	#[tokio::test]
	async fn order_ids_survive_a_restart() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let store = MemoryStorage::new();
		let engine = PortalEngine::new(
			&config,
			Arc::new(StorageService::new(Box::new(store.clone()))),
			Arc::new(NotificationService::new(Box::new(MemoryNotifier::new()))),
			Arc::new(RevalidationService::new(Box::new(MemoryRevalidation::new()))),
		);
		let c = customer(&engine).await;
		let first = submit(&engine, &c, "Maria").await;
		let first = engine
			.update_request(&first.public_id, complete())
			.await
			.unwrap();
		assert_eq!(first.order_id, Some(200));

		// A new engine over the same backend seeds its allocator from the
		// stored maximum instead of restarting at 200.
		let restarted = PortalEngine::new(
			&config,
			Arc::new(StorageService::new(Box::new(store))),
			Arc::new(NotificationService::new(Box::new(MemoryNotifier::new()))),
			Arc::new(RevalidationService::new(Box::new(MemoryRevalidation::new()))),
		);
		let second = submit(&restarted, &c, "Ana").await;
		let second = restarted
			.update_request(&second.public_id, complete())
			.await
			.unwrap();
		assert_eq!(second.order_id, Some(201));
	}

	#[tokio::test]
	async fn tracking_link_overrides_submitted_status() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		let updated = h
			.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					status: Some(RequestStatus::Completed),
					tracking_link: Some("https://planning.example/42".to_string()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.status, RequestStatus::InProgress);
		assert_eq!(updated.order_id, None);
		assert_eq!(
			updated.title_for_list,
			"Maria - [Em andamento]"
		);
	}

	#[tokio::test]
	async fn invalid_tracking_link_is_rejected() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		let result = h
			.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					tracking_link: Some("not a url".to_string()),
					..Default::default()
				},
			)
			.await;
		assert!(matches!(result, Err(PortalError::Validation(_))));
	}

	#[tokio::test]
	async fn status_change_sends_exactly_one_notification() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		assert!(h.notifier.sent().await.is_empty());

		h.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					status: Some(RequestStatus::InProgress),
					..Default::default()
				},
			)
			.await
			.unwrap();
		let sent = h.notifier.sent().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].to, "dr.silva@clinic.example");
	}

	#[tokio::test]
	async fn completion_sends_no_notification() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		h.engine
			.update_request(&created.public_id, complete())
			.await
			.unwrap();
		assert!(h.notifier.sent().await.is_empty());
	}

	#[tokio::test]
	async fn unchanged_update_sends_no_notification() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		h.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					additional_info: Some("obs".to_string()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert!(h.notifier.sent().await.is_empty());
	}

	#[tokio::test]
	async fn payment_change_notifies() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		h.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					payment: Some(PaymentInfo {
						status: PaymentStatus::Paid,
						pix_url: None,
						card_url: None,
					}),
					..Default::default()
				},
			)
			.await
			.unwrap();
		let sent = h.notifier.sent().await;
		assert_eq!(sent.len(), 1);
		assert!(sent[0].subject.contains("Pagamento confirmado"));
	}

	#[tokio::test]
	async fn notification_failure_does_not_fail_the_write() {
		let h = failing_notifier_harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		let updated = h
			.engine
			.update_request(
				&created.public_id,
				RequestPatch {
					status: Some(RequestStatus::InProgress),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.status, RequestStatus::InProgress);

		let stored = h.engine.get_request(&created.public_id).await.unwrap();
		assert_eq!(stored.status, RequestStatus::InProgress);
	}

	#[tokio::test]
	async fn writes_invalidate_configured_and_detail_paths() {
		let h = harness();
		let c = customer(&h.engine).await;
		let created = submit(&h.engine, &c, "Maria").await;
		let paths = h.revalidation.invalidated().await;
		assert_eq!(
			paths,
			vec![
				"/".to_string(),
				"/solicitacoes".to_string(),
				format!("/solicitacoes/{}", created.public_id),
			]
		);
	}

	#[tokio::test]
	async fn listing_is_newest_first_and_paginated() {
		let h = harness();
		let c = customer(&h.engine).await;
		for name in ["Maria", "Ana", "Clara"] {
			submit(&h.engine, &c, name).await;
			// Distinct creation instants keep the ordering observable.
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}

		let page1 = h.engine.list_requests(&c.id, 1, 2).await.unwrap();
		assert_eq!(page1.len(), 2);
		assert_eq!(page1[0].patient, "Clara");
		assert_eq!(page1[1].patient, "Ana");

		let page2 = h.engine.list_requests(&c.id, 2, 2).await.unwrap();
		assert_eq!(page2.len(), 1);
		assert_eq!(page2[0].patient, "Maria");

		assert!(h.engine.list_requests(&c.id, 3, 2).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn status_counts_track_the_lifecycle() {
		let h = harness();
		let c = customer(&h.engine).await;
		let a = submit(&h.engine, &c, "Maria").await;
		let b = submit(&h.engine, &c, "Ana").await;
		submit(&h.engine, &c, "Clara").await;

		h.engine
			.update_request(
				&a.public_id,
				RequestPatch {
					status: Some(RequestStatus::InProgress),
					..Default::default()
				},
			)
			.await
			.unwrap();
		h.engine.update_request(&b.public_id, complete()).await.unwrap();

		let counts = h.engine.status_counts(&c.id).await.unwrap();
		assert_eq!(
			counts,
			StatusCounts {
				documentation_check: 1,
				in_progress: 1,
				completed: 1,
			}
		);
	}

	#[tokio::test]
	async fn builder_wires_configured_backends() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let engine = PortalBuilder::new()
			.with_storage_factory(
				"memory",
				portal_storage::implementations::memory::create_storage,
			)
			.with_notifier_factory(
				"memory",
				portal_notify::implementations::memory::create_notifier,
			)
			.with_revalidation_factory(
				"memory",
				portal_revalidate::implementations::memory::create_revalidation,
			)
			.build(config)
			.unwrap();

		let c = customer(&engine).await;
		let created = submit(&engine, &c, "Maria").await;
		assert_eq!(
			engine.get_request(&created.public_id).await.unwrap().patient,
			"Maria"
		);
	}

	#[tokio::test]
	async fn builder_rejects_unknown_primary() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let result = PortalBuilder::new()
			.with_notifier_factory(
				"memory",
				portal_notify::implementations::memory::create_notifier,
			)
			.with_revalidation_factory(
				"memory",
				portal_revalidate::implementations::memory::create_revalidation,
			)
			.build(config);
		assert!(matches!(result, Err(PortalError::Config(_))));
	}
}
