//! Contact and correction form submissions.
//!
//! Submissions are screened and validated, then logged. Nothing is stored,
//! queued or delivered.

use crate::config::SubmissionConfig;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

const MAX_EMAIL_LEN: usize = 254;
const MAX_SOURCE_URLS: usize = 5;
const MAX_NOTES_LEN: usize = 2000;

/// Contact form categories
pub const CONTACT_CATEGORIES: [&str; 6] =
    ["general", "data", "correction", "partnership", "media", "other"];

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation failures, in the order they were found
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.to_string(), message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// Messages grouped by field
    pub fn flatten(&self) -> BTreeMap<String, Vec<String>> {
        let mut flattened: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            flattened.entry(error.field.clone()).or_default().push(error.message.clone());
        }
        flattened
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(error) if self.len() > 1 => {
                write!(f, "{} (and {} more)", error.message, self.len() - 1)
            }
            Some(error) => write!(f, "{}", error.message),
            None => write!(f, "no errors"),
        }
    }
}

/// Loose syntactic email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_http_url(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }

    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len < min {
        errors.add(field, format!("{label} must be at least {min} characters"));
    } else if len > max {
        errors.add(field, format!("{label} must be at most {max} characters"));
    }
}

/// Body of `POST /api/contact`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub category: String,
    pub subject: String,
    pub message: String,
    pub consent: bool,
    /// Honeypot; real visitors never see or fill this field
    pub company: String,
    /// Epoch milliseconds when the form was rendered
    pub rendered_at: Option<i64>,
}

impl ContactSubmission {
    /// Anti-bot checks: the honeypot must be empty and the form must have
    /// been open for at least the minimum fill time
    pub fn screen(&self, now_ms: i64, config: &SubmissionConfig) -> Result<(), ApiError> {
        if !self.company.trim().is_empty() {
            return Err(ApiError::SpamDetected("honeypot field filled".to_string()));
        }

        match self.rendered_at {
            Some(rendered_at) => match now_ms.checked_sub(rendered_at) {
                Some(elapsed) if elapsed >= config.min_fill_time_ms => Ok(()),
                _ => Err(ApiError::SpamDetected("form submitted too quickly".to_string())),
            },
            None => Err(ApiError::SpamDetected("form timestamp missing".to_string())),
        }
    }

    /// Schema validation
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_length(&mut errors, "name", "Name", &self.name, 2, 100);

        if !is_valid_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email address");
        }

        if !CONTACT_CATEGORIES.contains(&self.category.trim()) {
            errors.add("category", "Please choose a category");
        }

        check_length(&mut errors, "subject", "Subject", &self.subject, 3, 150);
        check_length(&mut errors, "message", "Message", &self.message, 10, 5000);

        if !self.consent {
            errors.add("consent", "You must agree to be contacted about this message");
        }

        errors.into_result()
    }
}

/// Body of `POST /api/corrections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrectionSubmission {
    pub player_slug: Option<String>,
    pub event_slug: Option<String>,
    /// Name of the field being corrected, e.g. `prize` or `result`
    pub field: String,
    pub current_value: Option<String>,
    pub proposed_value: String,
    pub source_urls: Vec<String>,
    pub reporter_email: Option<String>,
    pub notes: Option<String>,
    /// Answer to the arithmetic question shown on the form
    pub human_check: String,
}

impl CorrectionSubmission {
    pub fn validate(&self, config: &SubmissionConfig) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let has = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        if !has(&self.player_slug) && !has(&self.event_slug) {
            errors.add("playerSlug", "Identify the player or the event being corrected");
        }

        if self.field.trim().is_empty() {
            errors.add("field", "Field to correct is required");
        }

        if self.proposed_value.trim().is_empty() {
            errors.add("proposedValue", "Proposed value is required");
        }

        if self.source_urls.is_empty() {
            errors.add("sourceUrls", "At least one source URL is required");
        } else if self.source_urls.len() > MAX_SOURCE_URLS {
            errors.add("sourceUrls", format!("At most {MAX_SOURCE_URLS} source URLs are allowed"));
        }
        for url in &self.source_urls {
            if !is_http_url(url.trim()) {
                errors.add("sourceUrls", format!("Invalid URL: {url}"));
            }
        }

        if let Some(email) = self.reporter_email.as_deref().filter(|e| !e.trim().is_empty()) {
            if !is_valid_email(email.trim()) {
                errors.add("reporterEmail", "Please enter a valid email address");
            }
        }

        if self.notes.as_deref().is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN) {
            errors.add("notes", format!("Notes must be at most {MAX_NOTES_LEN} characters"));
        }

        if self.human_check.trim() != config.human_check_answer.trim() {
            errors.add("humanCheck", "Incorrect answer");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    fn valid_contact() -> ContactSubmission {
        ContactSubmission {
            name: "Dana Reyes".to_string(),
            email: "dana@example.com".to_string(),
            category: "data".to_string(),
            subject: "Missing payout".to_string(),
            message: "The Atlanta slam payout for doubles is missing.".to_string(),
            consent: true,
            company: String::new(),
            rendered_at: Some(NOW - 10_000),
        }
    }

    fn valid_correction() -> CorrectionSubmission {
        CorrectionSubmission {
            player_slug: Some("mara-lindqvist".to_string()),
            event_slug: None,
            field: "prize".to_string(),
            current_value: Some("$25,000".to_string()),
            proposed_value: "$27,500".to_string(),
            source_urls: vec!["https://example.com/results".to_string()],
            reporter_email: None,
            notes: None,
            human_check: "7".to_string(),
        }
    }

    #[test]
    fn test_valid_contact_passes() {
        let contact = valid_contact();
        assert!(contact.screen(NOW, &SubmissionConfig::default()).is_ok());
        assert!(contact.validate().is_ok());
    }

    #[test]
    fn test_honeypot_rejects_otherwise_valid_contact() {
        let contact = ContactSubmission { company: "Acme Bots".to_string(), ..valid_contact() };
        assert!(contact.validate().is_ok());
        assert!(matches!(
            contact.screen(NOW, &SubmissionConfig::default()),
            Err(ApiError::SpamDetected(_))
        ));
    }

    #[test]
    fn test_timing_gate() {
        let config = SubmissionConfig::default();

        let fast = ContactSubmission { rendered_at: Some(NOW - 2_999), ..valid_contact() };
        assert!(fast.screen(NOW, &config).is_err());

        let on_time = ContactSubmission { rendered_at: Some(NOW - 3_000), ..valid_contact() };
        assert!(on_time.screen(NOW, &config).is_ok());

        let missing = ContactSubmission { rendered_at: None, ..valid_contact() };
        assert!(missing.screen(NOW, &config).is_err());
    }

    #[test]
    fn test_out_of_range_render_time_is_rejected() {
        let config = SubmissionConfig::default();

        let ancient = ContactSubmission { rendered_at: Some(i64::MIN), ..valid_contact() };
        assert!(matches!(ancient.screen(NOW, &config), Err(ApiError::SpamDetected(_))));

        let future = ContactSubmission { rendered_at: Some(i64::MAX), ..valid_contact() };
        assert!(matches!(future.screen(NOW, &config), Err(ApiError::SpamDetected(_))));
    }

    #[test]
    fn test_contact_reports_first_error() {
        let contact = ContactSubmission {
            name: "D".to_string(),
            email: "not-an-email".to_string(),
            ..valid_contact()
        };
        let errors = contact.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().unwrap().field, "name");
        assert_eq!(errors.first().unwrap().message, "Name must be at least 2 characters");
    }

    #[test]
    fn test_contact_requires_consent_and_category() {
        let contact =
            ContactSubmission { consent: false, category: "spam".to_string(), ..valid_contact() };
        let flattened = contact.validate().unwrap_err().flatten();
        assert!(flattened.contains_key("consent"));
        assert!(flattened.contains_key("category"));
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
    }

    #[test]
    fn test_valid_correction_passes() {
        assert!(valid_correction().validate(&SubmissionConfig::default()).is_ok());
    }

    #[test]
    fn test_correction_errors_are_flattened_by_field() {
        let correction = CorrectionSubmission {
            player_slug: None,
            source_urls: vec!["ftp://example.com".to_string(), "notaurl".to_string()],
            human_check: "8".to_string(),
            ..valid_correction()
        };

        let flattened = correction.validate(&SubmissionConfig::default()).unwrap_err().flatten();
        assert_eq!(flattened["sourceUrls"].len(), 2);
        assert_eq!(flattened["humanCheck"], vec!["Incorrect answer".to_string()]);
        assert!(flattened.contains_key("playerSlug"));
    }

    #[test]
    fn test_correction_url_and_email_limits() {
        let correction = CorrectionSubmission {
            source_urls: vec!["https://example.com".to_string(); 6],
            reporter_email: Some("bad".to_string()),
            ..valid_correction()
        };
        let flattened = correction.validate(&SubmissionConfig::default()).unwrap_err().flatten();
        assert!(flattened.contains_key("sourceUrls"));
        assert!(flattened.contains_key("reporterEmail"));
    }

    #[test]
    fn test_source_urls_need_a_host() {
        for url in ["https://?", "http://:80", "https://#frag", "http://@", "https://"] {
            assert!(!is_http_url(url), "{url} accepted");
        }
        assert!(is_http_url("https://example.com/results?event=atlanta"));
        assert!(is_http_url("http://127.0.0.1:8080/draw"));

        let correction = CorrectionSubmission {
            source_urls: vec!["https://?".to_string()],
            ..valid_correction()
        };
        let flattened = correction.validate(&SubmissionConfig::default()).unwrap_err().flatten();
        assert_eq!(flattened["sourceUrls"], vec!["Invalid URL: https://?".to_string()]);
    }

    #[test]
    fn test_event_slug_alone_identifies_correction() {
        let correction = CorrectionSubmission {
            player_slug: None,
            event_slug: Some("ppa-atlanta-slam-2025".to_string()),
            ..valid_correction()
        };
        assert!(correction.validate(&SubmissionConfig::default()).is_ok());
    }
}
