//! Notification module for the portal system.
//!
//! Sends status-update emails to customers through a pluggable gateway.
//! The service owns subject and body composition; backends only deliver.
//! Notifications carry a subject and a plain-text body, nothing more.

use async_trait::async_trait;
use portal_types::{ConfigSchema, ImplementationRegistry, Request, RequestStatus, TrackingStatus};
use serde::Serialize;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod webhook;
}

/// Errors that can occur during notification operations.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error connecting to the gateway.
	#[error("Network error: {0}")]
	Network(String),
	/// The gateway refused the notification.
	#[error("Rejected by gateway: {0}")]
	Rejected(String),
	/// Error in the backend configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// An outbound customer notification.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
	/// Recipient email address.
	pub to: String,
	pub subject: String,
	pub body: String,
}

/// Trait defining the interface for notification backends.
#[async_trait]
pub trait NotifierInterface: Send + Sync {
	/// Delivers a notification to its recipient.
	async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for notifier factory functions.
pub type NotifierFactory = fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>;

/// Registry trait for notifier implementations.
pub trait NotifierRegistry: ImplementationRegistry<Factory = NotifierFactory> {}

/// Get all registered notifier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotifierFactory)> {
	use implementations::{memory, webhook};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(webhook::Registry::NAME, webhook::Registry::factory()),
	]
}

/// How the request is referred to in subjects and bodies: by order number
/// once one has been assigned, by patient name before that.
fn case_reference(request: &Request) -> String {
	match request.order_id {
		Some(order_id) => format!("pedido #{}", order_id),
		None => format!("caso de {}", request.patient),
	}
}

/// Composes the status-update notification for a request.
///
/// The subject follows the most specific state that changed visibility for
/// the customer: shipment first, then payment, then planning availability,
/// then the main status.
pub fn status_update_notification(request: &Request, to: &str) -> Notification {
	let reference = case_reference(request);

	let subject = match request.tracking.status {
		TrackingStatus::Delivered => format!("Seu {} foi entregue", reference),
		TrackingStatus::Sent => format!("Seu {} foi enviado", reference),
		TrackingStatus::Preparing => format!("Seu {} está sendo preparado", reference),
		TrackingStatus::NotSent => {
			if request.payment.status == portal_types::PaymentStatus::Paid {
				format!("Pagamento confirmado para o {}", reference)
			} else if request.status == RequestStatus::Completed {
				format!("Seu {} foi finalizado", reference)
			} else if request.tracking_link.is_some() {
				format!("O planejamento virtual do seu {} está disponível", reference)
			} else if request.status == RequestStatus::InProgress {
				format!("Seu {} está em andamento", reference)
			} else {
				format!("Recebemos a documentação do seu {}", reference)
			}
		},
	};

	let mut body = format!(
		"Olá,\n\nHouve uma atualização no {}.\n\nStatus atual: {}\nPagamento: {}\nEnvio: {}\n",
		reference,
		request.status.label(),
		request.payment.status.label(),
		request.tracking.status.label(),
	);
	if let Some(link) = &request.tracking_link {
		body.push_str(&format!("Planejamento virtual: {}\n", link));
	}
	body.push_str("\nAcesse o portal para mais detalhes.\n");

	Notification {
		to: to.to_string(),
		subject,
		body,
	}
}

/// High-level notification service.
pub struct NotificationService {
	backend: Box<dyn NotifierInterface>,
}

impl NotificationService {
	/// Creates a new NotificationService with the specified backend.
	pub fn new(backend: Box<dyn NotifierInterface>) -> Self {
		Self { backend }
	}

	/// Composes and sends the status-update email for a request.
	pub async fn send_status_update(&self, to: &str, request: &Request) -> Result<(), NotifyError> {
		let notification = status_update_notification(request, to);
		self.backend.send(&notification).await
	}
}
