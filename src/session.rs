//! Form state for one user session.
//!
//! The [`Workbench`] models the problem form, the debug form and the result
//! panel as a small state machine:
//!
//! ```text
//! Idle --begin_generate--> Generating --complete_generate--> Idle
//! Idle --begin_regenerate--> Regenerating --complete_regenerate--> Idle
//! ```
//!
//! Every submission is issued a [`Ticket`]. A completion is applied only if
//! its ticket is the most recent one and the workbench has not been reset
//! since it was issued; anything else is dropped.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ImageError, SessionError};
use crate::language::Language;
use crate::types::{ActionResponse, GenerationRequest, GenerationResult, RegenerationRequest};
use crate::utils::code_fence::strip_code_fence;
use crate::utils::data_uri::{encode_data_uri, encode_image_file, DEFAULT_MAX_IMAGE_BYTES};

/// What the workbench is waiting on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Regenerating,
}

/// Operation a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Regenerate,
}

impl Operation {
    fn phase(self) -> Phase {
        match self {
            Operation::Generate => Phase::Generating,
            Operation::Regenerate => Phase::Regenerating,
        }
    }
}

/// Receipt for an in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    epoch: u64,
    operation: Operation,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Primary form: the problem statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemForm {
    pub problem_description: String,
    pub constraints: String,
    pub examples: String,
    pub language: Language,
    /// Attached image, already encoded.
    pub photo_data_uri: Option<String>,
}

impl ProblemForm {
    /// Builds a request from the current field values.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            problem_description: Some(self.problem_description.clone()),
            constraints: Some(self.constraints.clone()),
            example_inputs_outputs: Some(self.examples.clone()),
            language: Some(self.language.id().to_string()),
            photo_data_uri: self.photo_data_uri.clone(),
        }
    }
}

/// Follow-up form: code to fix and the error the user saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugForm {
    pub code: String,
    pub error_report: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A toast shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Form and result state for one session.
#[derive(Debug, Clone)]
pub struct Workbench {
    pub problem: ProblemForm,
    pub debug: DebugForm,
    phase: Phase,
    code: Option<String>,
    explanation: Option<String>,
    next_seq: u64,
    latest: Option<u64>,
    epoch: u64,
    notifications: Vec<Notification>,
    max_image_bytes: usize,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    pub fn new() -> Self {
        Self {
            problem: ProblemForm::default(),
            debug: DebugForm::default(),
            phase: Phase::Idle,
            code: None,
            explanation: None,
            next_seq: 0,
            latest: None,
            epoch: 0,
            notifications: Vec::new(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Displayed code, with fences stripped.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// The debug form is only offered once there is code to debug.
    pub fn can_debug(&self) -> bool {
        self.code.is_some()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Removes and returns all pending notifications.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Encodes raw image bytes and attaches them to the problem form.
    ///
    /// Oversized images are rejected with an error notification and leave the
    /// current attachment untouched.
    pub fn attach_image(&mut self, mime: &str, bytes: &[u8]) -> Result<(), SessionError> {
        if !mime.starts_with("image/") {
            return Err(self.reject_image(ImageError::UnsupportedMediaType(mime.to_string())));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(self.reject_image(ImageError::TooLarge {
                size: bytes.len(),
                limit: self.max_image_bytes,
            }));
        }
        self.problem.photo_data_uri = Some(encode_data_uri(mime, bytes));
        Ok(())
    }

    /// Reads an image file and attaches it to the problem form.
    pub fn attach_image_file(&mut self, path: &Path) -> Result<(), SessionError> {
        match encode_image_file(path, self.max_image_bytes) {
            Ok(uri) => {
                self.problem.photo_data_uri = Some(uri);
                Ok(())
            }
            Err(e) => Err(self.reject_image(e)),
        }
    }

    pub fn clear_image(&mut self) {
        self.problem.photo_data_uri = None;
    }

    fn reject_image(&mut self, err: ImageError) -> SessionError {
        let message = err.to_string();
        tracing::warn!(error = %message, "Image rejected");
        self.notify(NotificationKind::Error, "Image rejected", message.clone());
        SessionError::Rejected(message)
    }

    /// Starts a generation: clears the displayed result and returns the request
    /// to send.
    pub fn begin_generate(&mut self) -> Result<(Ticket, GenerationRequest), SessionError> {
        let ticket = self.issue(Operation::Generate)?;
        self.code = None;
        self.explanation = None;
        Ok((ticket, self.problem.to_request()))
    }

    /// Starts a debug round from the debug form.
    pub fn begin_regenerate(&mut self) -> Result<(Ticket, RegenerationRequest), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if !self.can_debug() {
            return Err(SessionError::NothingToDebug);
        }
        let ticket = self.issue(Operation::Regenerate)?;
        let request = RegenerationRequest {
            problem: self.problem.to_request(),
            previous_code: Some(self.debug.code.clone()),
            error_report: Some(self.debug.error_report.clone()),
        };
        Ok((ticket, request))
    }

    /// Applies the outcome of a generation. Returns false when the completion
    /// was stale and dropped.
    pub fn complete_generate(&mut self, ticket: Ticket, response: ActionResponse) -> bool {
        self.complete(ticket, Operation::Generate, response)
    }

    /// Applies the outcome of a debug round. Returns false when the completion
    /// was stale and dropped.
    pub fn complete_regenerate(&mut self, ticket: Ticket, response: ActionResponse) -> bool {
        self.complete(ticket, Operation::Regenerate, response)
    }

    /// Clears all forms and results. Completions of earlier tickets are ignored
    /// from now on.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.latest = None;
        self.phase = Phase::Idle;
        self.problem = ProblemForm::default();
        self.debug = DebugForm::default();
        self.code = None;
        self.explanation = None;
        self.notifications.clear();
    }

    fn issue(&mut self, operation: Operation) -> Result<Ticket, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.next_seq += 1;
        self.latest = Some(self.next_seq);
        self.phase = operation.phase();
        Ok(Ticket {
            seq: self.next_seq,
            epoch: self.epoch,
            operation,
        })
    }

    fn is_current(&self, ticket: &Ticket, operation: Operation) -> bool {
        ticket.epoch == self.epoch
            && self.latest == Some(ticket.seq)
            && ticket.operation == operation
            && self.phase == operation.phase()
    }

    fn complete(&mut self, ticket: Ticket, operation: Operation, response: ActionResponse) -> bool {
        if !self.is_current(&ticket, operation) {
            tracing::debug!(
                seq = ticket.seq,
                latest = ?self.latest,
                epoch = self.epoch,
                "Dropping stale completion"
            );
            return false;
        }

        self.phase = Phase::Idle;
        match response.into_result() {
            Ok(result) => self.apply_result(operation, result),
            Err(message) => self.notify(NotificationKind::Error, "Error", message),
        }
        true
    }

    fn apply_result(&mut self, operation: Operation, result: GenerationResult) {
        let code = strip_code_fence(&result.code);
        self.debug.code = code.clone();
        self.code = Some(code);
        self.explanation = result.explanation;

        let message = match operation {
            Operation::Generate => "Your code has been generated.",
            Operation::Regenerate => {
                self.debug.error_report.clear();
                "Your code has been corrected."
            }
        };
        self.notify(NotificationKind::Success, "Success!", message);
    }

    fn notify(&mut self, kind: NotificationKind, title: &str, message: impl Into<String>) {
        self.notifications.push(Notification {
            kind,
            title: title.to_string(),
            message: message.into(),
            at: Utc::now(),
        });
    }
}
