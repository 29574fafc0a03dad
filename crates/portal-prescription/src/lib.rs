//! Prescription rule set for treatment request submissions.
//!
//! One shared rule set applied by the lifecycle engine on both create and
//! update, after patch merging, so the API layer and the engine cannot
//! drift apart. Violations are collected per field and reported together
//! rather than failing on the first one. Field paths in issues use the
//! wire (camelCase) names so API clients can map them back onto the form.

use portal_types::{
	Document, PerformIpr, Prescription, YesNo, LOWER_ARCH_TEETH, UPPER_ARCH_TEETH,
};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Document slots that must carry an attached file before planning can start.
pub const REQUIRED_DOCUMENTS: [&str; 4] = [
	"Radiografia panorâmica",
	"Telerradiografia",
	"Arquivo STL da arcada superior",
	"Arquivo STL da arcada inferior",
];

/// Brazilian mobile-phone pattern: area code without leading zero, optional
/// ninth digit, e.g. `(11) 91234-5678`.
const WHATSAPP_PATTERN: &str = r"^\([1-9]{2}\)\s?9?\d{4}-\d{4}$";

fn whatsapp_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	// The pattern is a literal constant, so compilation cannot fail.
	RE.get_or_init(|| Regex::new(WHATSAPP_PATTERN).expect("phone pattern compiles"))
}

/// A single rule violation, tied to the wire name of the offending field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldIssue {
	pub field: String,
	pub message: String,
}

impl FieldIssue {
	fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// The collected rule violations for a submission.
#[derive(Debug, Error)]
#[error("prescription validation failed with {} issue(s)", .issues.len())]
pub struct RuleViolations {
	pub issues: Vec<FieldIssue>,
}

/// Whether the document being validated is a fresh submission or a merged
/// update of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
	Create,
	Update,
}

/// Validates a merged request document against the full rule set.
///
/// `tracking_link` and `documents` live outside the prescription block but
/// are validated here so every write goes through a single gate.
pub fn validate(
	patient: &str,
	documents: &[Document],
	prescription: &Prescription,
	tracking_link: Option<&str>,
	mode: ValidationMode,
) -> Result<(), RuleViolations> {
	let mut issues = Vec::new();

	if patient.trim().is_empty() {
		issues.push(FieldIssue::new("patient", "Nome do paciente é obrigatório"));
	}

	if prescription.general_instructions.trim().is_empty() {
		issues.push(FieldIssue::new(
			"generalInstructions",
			"Instruções gerais são obrigatórias",
		));
	}

	check_arch_restrictions(prescription, &mut issues);
	check_tooth_codes(prescription, &mut issues);
	check_ipr(prescription, &mut issues);
	check_whatsapp(prescription, &mut issues);
	check_documents(documents, mode, &mut issues);
	check_tracking_link(tracking_link, &mut issues);

	if issues.is_empty() {
		Ok(())
	} else {
		Err(RuleViolations { issues })
	}
}

fn check_arch_restrictions(prescription: &Prescription, issues: &mut Vec<FieldIssue>) {
	if prescription.arch_to_treat.includes_upper()
		&& prescription.upper_jaw_movement_restriction.is_empty()
	{
		issues.push(FieldIssue::new(
			"upperJawMovementRestriction",
			"Selecione a restrição de movimento da arcada superior",
		));
	}
	if prescription.arch_to_treat.includes_lower()
		&& prescription.lower_jaw_movement_restriction.is_empty()
	{
		issues.push(FieldIssue::new(
			"lowerJawMovementRestriction",
			"Selecione a restrição de movimento da arcada inferior",
		));
	}
}

fn check_tooth_codes(prescription: &Prescription, issues: &mut Vec<FieldIssue>) {
	let upper_lists = [
		("upperJawMovementRestriction", &prescription.upper_jaw_movement_restriction),
		("upperJawNoAttachments", &prescription.upper_jaw_no_attachments),
	];
	for (field, list) in upper_lists {
		for code in list {
			if !UPPER_ARCH_TEETH.contains(&code.as_str()) {
				issues.push(FieldIssue::new(
					field,
					format!("Dente {} não pertence à arcada superior", code),
				));
			}
		}
	}

	let lower_lists = [
		("lowerJawMovementRestriction", &prescription.lower_jaw_movement_restriction),
		("lowerJawNoAttachments", &prescription.lower_jaw_no_attachments),
	];
	for (field, list) in lower_lists {
		for code in list {
			if !LOWER_ARCH_TEETH.contains(&code.as_str()) {
				issues.push(FieldIssue::new(
					field,
					format!("Dente {} não pertence à arcada inferior", code),
				));
			}
		}
	}
}

fn check_ipr(prescription: &Prescription, issues: &mut Vec<FieldIssue>) {
	if prescription.perform_ipr == PerformIpr::DetailBelow
		&& prescription
			.ipr_details
			.as_deref()
			.map(str::trim)
			.unwrap_or_default()
			.is_empty()
	{
		issues.push(FieldIssue::new(
			"iprDetails",
			"Detalhe o IPR desejado",
		));
	}
}

fn check_whatsapp(prescription: &Prescription, issues: &mut Vec<FieldIssue>) {
	let number = prescription
		.whatsapp_number
		.as_deref()
		.map(str::trim)
		.unwrap_or_default();

	if prescription.send_whatsapp_link == YesNo::Yes && number.is_empty() {
		issues.push(FieldIssue::new(
			"whatsappNumber",
			"Informe o número de WhatsApp",
		));
		return;
	}

	// A provided number must be well-formed regardless of the link selection.
	if !number.is_empty() && !whatsapp_regex().is_match(number) {
		issues.push(FieldIssue::new(
			"whatsappNumber",
			"Número inválido, use o formato (11) 91234-5678",
		));
	}
}

fn check_documents(documents: &[Document], mode: ValidationMode, issues: &mut Vec<FieldIssue>) {
	for name in REQUIRED_DOCUMENTS {
		let slot = documents.iter().find(|d| d.document_name == name);
		match slot {
			Some(doc) if doc.document_file.is_some() => {},
			Some(_) => {
				issues.push(FieldIssue::new(
					"documents",
					format!("Documento obrigatório sem arquivo: {}", name),
				));
			},
			// Older stored records may predate a slot; only fresh submissions
			// must carry every required slot.
			None if mode == ValidationMode::Create => {
				issues.push(FieldIssue::new(
					"documents",
					format!("Documento obrigatório ausente: {}", name),
				));
			},
			None => {},
		}
	}
}

fn check_tracking_link(tracking_link: Option<&str>, issues: &mut Vec<FieldIssue>) {
	if let Some(link) = tracking_link {
		if !link.is_empty() && Url::parse(link).is_err() {
			issues.push(FieldIssue::new(
				"trackingLink",
				"Link de acompanhamento não é uma URL válida",
			));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use portal_types::{ApRelation, ArchToTreat, ElasticCutouts, MediaRef};

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
			perform_ipr: PerformIpr::Yes,
			ipr_details: None,
			diastema_instructions: None,
			general_instructions: "Alinhar e nivelar".to_string(),
			send_whatsapp_link: YesNo::No,
			whatsapp_number: None,
		}
	}

	fn documents() -> Vec<Document> {
		REQUIRED_DOCUMENTS
			.iter()
			.map(|name| Document {
				document_name: name.to_string(),
				document_file: Some(MediaRef {
					id: "m1".to_string(),
					filename: Some("scan.stl".to_string()),
					url: None,
				}),
			})
			.collect()
	}

	fn issues_for(
		patient: &str,
		documents: &[Document],
		prescription: &Prescription,
		tracking_link: Option<&str>,
		mode: ValidationMode,
	) -> Vec<FieldIssue> {
		match validate(patient, documents, prescription, tracking_link, mode) {
			Ok(()) => vec![],
			Err(violations) => violations.issues,
		}
	}

	#[test]
	fn valid_submission_passes() {
		assert!(validate(
			"Maria Souza",
			&documents(),
			&prescription(),
			None,
			ValidationMode::Create,
		)
		.is_ok());
	}

	#[test]
	fn empty_patient_and_instructions_are_both_reported() {
		let mut p = prescription();
		p.general_instructions = "  ".to_string();
		let issues = issues_for("", &documents(), &p, None, ValidationMode::Create);
		let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
		assert!(fields.contains(&"patient"));
		assert!(fields.contains(&"generalInstructions"));
	}

	#[test]
	fn treated_arch_requires_restriction_selection() {
		let mut p = prescription();
		p.arch_to_treat = ArchToTreat::Upper;
		p.upper_jaw_movement_restriction.clear();
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(issues.iter().any(|i| i.field == "upperJawMovementRestriction"));

		// Lower arch untouched by the treatment needs no selection.
		p.lower_jaw_movement_restriction.clear();
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(!issues.iter().any(|i| i.field == "lowerJawMovementRestriction"));
	}

	#[test]
	fn untreated_arches_need_no_restriction() {
		let mut p = prescription();
		p.arch_to_treat = ArchToTreat::None;
		p.upper_jaw_movement_restriction.clear();
		p.lower_jaw_movement_restriction.clear();
		assert!(validate("Maria", &documents(), &p, None, ValidationMode::Create).is_ok());
	}

	#[test]
	fn tooth_codes_must_belong_to_their_arch() {
		let mut p = prescription();
		p.upper_jaw_movement_restriction = vec!["31".to_string()];
		p.lower_jaw_no_attachments = vec!["11".to_string()];
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(issues.iter().any(|i| i.field == "upperJawMovementRestriction"));
		assert!(issues.iter().any(|i| i.field == "lowerJawNoAttachments"));
	}

	#[test]
	fn ipr_detail_below_requires_details() {
		let mut p = prescription();
		p.perform_ipr = PerformIpr::DetailBelow;
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(issues.iter().any(|i| i.field == "iprDetails"));

		p.ipr_details = Some("0.3mm entre 13 e 14".to_string());
		assert!(validate("Maria", &documents(), &p, None, ValidationMode::Create).is_ok());
	}

	#[test]
	fn whatsapp_number_required_when_link_requested() {
		let mut p = prescription();
		p.send_whatsapp_link = YesNo::Yes;
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(issues.iter().any(|i| i.field == "whatsappNumber"));
	}

	#[test]
	fn whatsapp_number_format_checked_even_without_link() {
		let mut p = prescription();
		p.whatsapp_number = Some("11 91234 5678".to_string());
		let issues = issues_for("Maria", &documents(), &p, None, ValidationMode::Create);
		assert!(issues.iter().any(|i| i.field == "whatsappNumber"));

		p.whatsapp_number = Some("(11) 91234-5678".to_string());
		assert!(validate("Maria", &documents(), &p, None, ValidationMode::Create).is_ok());
		p.whatsapp_number = Some("(11)1234-5678".to_string());
		assert!(validate("Maria", &documents(), &p, None, ValidationMode::Create).is_ok());
	}

	#[test]
	fn required_documents_need_files_on_create() {
		let mut docs = documents();
		docs[0].document_file = None;
		docs.remove(1);
		let issues = issues_for("Maria", &docs, &prescription(), None, ValidationMode::Create);
		let doc_issues: Vec<&FieldIssue> =
			issues.iter().filter(|i| i.field == "documents").collect();
		assert_eq!(doc_issues.len(), 2);
	}

	#[test]
	fn update_tolerates_missing_slots_but_not_empty_ones() {
		let mut docs = documents();
		docs.remove(0);
		assert!(validate("Maria", &docs, &prescription(), None, ValidationMode::Update).is_ok());

		docs[0].document_file = None;
		let issues = issues_for("Maria", &docs, &prescription(), None, ValidationMode::Update);
		assert!(issues.iter().any(|i| i.field == "documents"));
	}

	#[test]
	fn tracking_link_must_be_a_url() {
		let issues = issues_for(
			"Maria",
			&documents(),
			&prescription(),
			Some("not a url"),
			ValidationMode::Update,
		);
		assert!(issues.iter().any(|i| i.field == "trackingLink"));

		assert!(validate(
			"Maria",
			&documents(),
			&prescription(),
			Some("https://planning.example/case/42"),
			ValidationMode::Update,
		)
		.is_ok());
	}
}
