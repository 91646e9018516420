//! Payload validation.
//!
//! One pure function per request shape. Each takes the decoded (all-optional)
//! payload and returns either the typed input for the store or every field
//! violation found, in field order. Nothing here touches storage.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::{CreateComment, CreateProject, CreateTicket, Priority, TicketStatus, UpdateTicket};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

// ============================================================================
// Errors
// ============================================================================

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Ordered list of field violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message of the first violation, used where only one can be reported.
    pub fn first_message(&self) -> &str {
        self.0
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("Invalid request")
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when no violation was recorded.
    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

// ============================================================================
// Request payloads
// ============================================================================

/// Body of `POST /tickets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub reporter: Option<String>,
    pub project_id: Option<String>,
}

/// Body of `PATCH /tickets/:id`. Absent and `null` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub reporter: Option<String>,
}

/// Body of `POST /tickets/:id/comments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentCreateRequest {
    pub author: Option<String>,
    pub body: Option<String>,
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateRequest {
    pub name: Option<String>,
    pub parent_project: Option<String>,
}

/// Body of `POST /signup`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated signup. The password is still plaintext here.
#[derive(Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Signup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signup")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Field rules
// ============================================================================

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Check a present value against inclusive length bounds.
fn check_len(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = char_len(value);
    if len < min {
        errors.push(field, format!("{} must be at least {} characters", label, min));
    } else if let Some(max) = max {
        if len > max {
            errors.push(field, format!("{} must be at most {} characters", label, max));
        }
    }
}

/// Required field: absent is reported, present is handed to `check`.
fn required<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value.as_deref() {
        Some(v) => Some(v),
        None => {
            errors.push(field, format!("{} is required", field));
            None
        }
    }
}

fn check_title(errors: &mut ValidationErrors, value: &str) {
    check_len(errors, "title", "Title", value, 4, Some(100));
}

fn check_description(errors: &mut ValidationErrors, value: &str) {
    check_len(errors, "description", "Description", value, 10, None);
}

fn check_reporter(errors: &mut ValidationErrors, value: &str) {
    check_len(errors, "reporter", "Reporter name", value, 2, None);
}

fn parse_priority(errors: &mut ValidationErrors, value: &str) -> Option<Priority> {
    let parsed = value.parse::<Priority>().ok();
    if parsed.is_none() {
        errors.push("priority", "Priority must be one of LOW, MEDIUM, HIGH");
    }
    parsed
}

fn parse_status(errors: &mut ValidationErrors, value: &str) -> Option<TicketStatus> {
    let parsed = value.parse::<TicketStatus>().ok();
    if parsed.is_none() {
        errors.push("status", "Status must be one of OPEN, IN_PROGRESS, CLOSED");
    }
    parsed
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    if !is_valid_email(value) {
        errors.push("email", "Invalid email address");
    }
}

/// Syntactic email check: one `@`, a dotted domain, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_RE.is_match(value)
}

// ============================================================================
// Validators
// ============================================================================

pub fn validate_ticket_create(req: &TicketCreateRequest) -> Result<CreateTicket, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(title) = required(&mut errors, "title", &req.title) {
        check_title(&mut errors, title);
    }
    if let Some(description) = required(&mut errors, "description", &req.description) {
        check_description(&mut errors, description);
    }
    let priority = required(&mut errors, "priority", &req.priority)
        .and_then(|p| parse_priority(&mut errors, p));
    if let Some(reporter) = required(&mut errors, "reporter", &req.reporter) {
        check_reporter(&mut errors, reporter);
    }

    errors.finish(|| CreateTicket {
        title: req.title.clone().unwrap_or_default(),
        description: req.description.clone().unwrap_or_default(),
        priority: priority.unwrap_or_default(),
        reporter: req.reporter.clone().unwrap_or_default(),
        project_id: req.project_id.clone(),
    })
}

/// Present fields get the create bounds; an empty string is present and
/// therefore rejected rather than silently ignored.
pub fn validate_ticket_update(req: &TicketUpdateRequest) -> Result<UpdateTicket, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(title) = req.title.as_deref() {
        check_title(&mut errors, title);
    }
    if let Some(description) = req.description.as_deref() {
        check_description(&mut errors, description);
    }
    let priority = req
        .priority
        .as_deref()
        .and_then(|p| parse_priority(&mut errors, p));
    let status = req
        .status
        .as_deref()
        .and_then(|s| parse_status(&mut errors, s));
    if let Some(reporter) = req.reporter.as_deref() {
        check_reporter(&mut errors, reporter);
    }

    errors.finish(|| UpdateTicket {
        title: req.title.clone(),
        description: req.description.clone(),
        priority,
        status,
        reporter: req.reporter.clone(),
    })
}

pub fn validate_comment_create(req: &CommentCreateRequest) -> Result<CreateComment, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(author) = required(&mut errors, "author", &req.author) {
        check_len(&mut errors, "author", "Author name", author, 2, None);
    }
    if let Some(body) = required(&mut errors, "body", &req.body) {
        check_len(&mut errors, "body", "Comment", body, 2, Some(500));
    }

    errors.finish(|| CreateComment {
        author: req.author.clone().unwrap_or_default(),
        body: req.body.clone().unwrap_or_default(),
    })
}

pub fn validate_project_create(req: &ProjectCreateRequest) -> Result<CreateProject, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if req.name.as_deref().map_or(true, str::is_empty) {
        errors.push("name", "Project name is required");
    }
    if req.parent_project.as_deref().map_or(true, str::is_empty) {
        errors.push("parentProject", "Parent project is required");
    }

    errors.finish(|| CreateProject {
        name: req.name.clone().unwrap_or_default(),
        parent_project: req.parent_project.clone().unwrap_or_default(),
    })
}

pub fn validate_signup(req: &SignupRequest) -> Result<Signup, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if req.name.as_deref().map_or(true, str::is_empty) {
        errors.push("name", "Name is required");
    }
    if let Some(email) = required(&mut errors, "email", &req.email) {
        check_email(&mut errors, email);
    }
    if let Some(password) = required(&mut errors, "password", &req.password) {
        check_len(&mut errors, "password", "Password", password, 6, None);
    }

    errors.finish(|| Signup {
        name: req.name.clone().unwrap_or_default(),
        email: req.email.clone().unwrap_or_default(),
        password: req.password.clone().unwrap_or_default(),
    })
}

pub fn validate_login(req: &LoginRequest) -> Result<Credentials, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(email) = required(&mut errors, "email", &req.email) {
        check_email(&mut errors, email);
    }
    if req.password.as_deref().map_or(true, str::is_empty) {
        errors.push("password", "Password is required");
    }

    errors.finish(|| Credentials {
        email: req.email.clone().unwrap_or_default(),
        password: req.password.clone().unwrap_or_default(),
    })
}
