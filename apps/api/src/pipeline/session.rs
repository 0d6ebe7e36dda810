//! Processing state machine for one uploaded document.
//!
//! ```text
//! Idle ──upload──▶ Analyzing ──ok──▶ AnalysisCompleted ──optimize──▶ Processing ──ok──▶ Completed
//!  ▲  │                 │                                               │                 │
//!  │  └──history select─┼───────────────────────────────────────────────┼────────────────▶│
//!  │                    └──fail──▶ Error ◀──────────────fail────────────┘                 │
//!  └──────────────── reset (from Idle, AnalysisCompleted, Completed, Error) ◀─────────────┘
//! ```
//!
//! Every method here is synchronous: callers hold the session mutex only for
//! the transition itself, never across a gateway or store call. While a
//! session is `Analyzing`/`Processing` (or a payment is processing) every
//! other trigger is refused, which is what keeps one transition in flight.

use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::{AnalysisReport, DocumentInput};
use crate::i18n::Language;
use crate::models::optimization::OptimizationRecord;
use crate::paywall::{PaymentStep, PaywallPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Idle,
    Analyzing,
    AnalysisCompleted,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("cannot {action} while the session is {stage:?}")]
    InvalidTransition { action: &'static str, stage: Stage },

    #[error("the document is locked until payment is confirmed")]
    Locked,
}

/// The file the user selected, as received.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// The canonical HTML artifact currently displayed, with its paywall state.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDocument {
    pub html: String,
    pub filename: String,
    pub record_id: Option<Uuid>,
    pub order_number: Option<String>,
    pub unlocked: bool,
}

impl CompletedDocument {
    /// Rebuilds the displayed document from a stored record, reusing its paid flag.
    pub fn from_record(record: &OptimizationRecord, paywall: PaywallPolicy) -> Self {
        Self {
            html: record.html_content.clone(),
            filename: record.original_filename.clone(),
            record_id: Some(record.id),
            order_number: Some(record.order_number.clone()),
            unlocked: paywall.is_unlocked(record.is_paid),
        }
    }
}

/// Everything the optimize step needs, captured when `Processing` begins.
#[derive(Debug, Clone)]
pub struct OptimizationJob {
    pub owner_id: Option<String>,
    pub filename: String,
    pub document: DocumentInput,
    pub language: Language,
    pub instructions: Option<String>,
}

/// Outcome of asking to start a payment.
#[derive(Debug, PartialEq)]
pub enum PaymentStart {
    /// Step moved to `processing`; the caller must drive the charge and hand
    /// `ticket` back to settle or fail it.
    Started {
        ticket: Uuid,
        record_id: Option<Uuid>,
        order_number: Option<String>,
    },
    /// Unlock is monotonic; nothing to charge.
    AlreadyUnlocked,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub record_id: Option<Uuid>,
    pub order_number: Option<String>,
    pub filename: String,
    pub unlocked: bool,
    /// Locked documents render as a blurred, non-interactive preview.
    pub blurred: bool,
    pub preview_html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub stage: Stage,
    pub output_language: Language,
    pub busy: bool,
    pub filename: Option<String>,
    pub instructions: Option<String>,
    pub analysis: Option<AnalysisReport>,
    pub document: Option<DocumentView>,
    pub payment_step: PaymentStep,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct PipelineSession {
    id: Uuid,
    owner_id: Option<String>,
    stage: Stage,
    language: Language,
    upload: Option<UploadedDocument>,
    instructions: Option<String>,
    analysis: Option<AnalysisReport>,
    document: Option<CompletedDocument>,
    payment_step: PaymentStep,
    // Charge in flight, tied to the document that was displayed when it began.
    pending_payment: Option<Uuid>,
    error: Option<String>,
    last_touched: Instant,
}

impl PipelineSession {
    pub fn new(id: Uuid, owner_id: Option<String>, language: Language) -> Self {
        Self {
            id,
            owner_id,
            stage: Stage::Idle,
            language,
            upload: None,
            instructions: None,
            analysis: None,
            document: None,
            payment_step: PaymentStep::Details,
            pending_payment: None,
            error: None,
            last_touched: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// True while async work for this session is outstanding, including a
    /// charge that is authorized but not yet settled.
    pub fn is_busy(&self) -> bool {
        matches!(self.stage, Stage::Analyzing | Stage::Processing)
            || self.pending_payment.is_some()
    }

    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }

    pub fn expect_stage(&self, action: &'static str, allowed: &[Stage]) -> Result<(), PipelineError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                action,
                stage: self.stage,
            })
        }
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), PipelineError> {
        self.expect_stage("change the output language", &[Stage::Idle])?;
        self.language = language;
        Ok(())
    }

    /// Idle → Analyzing. Input validation happens before this is called.
    pub fn begin_analysis(&mut self, upload: UploadedDocument) -> Result<DocumentInput, PipelineError> {
        self.expect_stage("upload a document", &[Stage::Idle])?;
        let document = DocumentInput {
            bytes: upload.bytes.clone(),
            mime_type: upload.mime_type.clone(),
        };
        self.upload = Some(upload);
        self.analysis = None;
        self.document = None;
        self.error = None;
        self.payment_step = PaymentStep::Details;
        self.stage = Stage::Analyzing;
        Ok(document)
    }

    /// Analyzing → AnalysisCompleted.
    pub fn complete_analysis(&mut self, report: AnalysisReport) -> Result<(), PipelineError> {
        self.expect_stage("complete analysis", &[Stage::Analyzing])?;
        self.analysis = Some(report);
        self.stage = Stage::AnalysisCompleted;
        Ok(())
    }

    /// Analyzing | Processing → Error.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), PipelineError> {
        self.expect_stage("record a failure", &[Stage::Analyzing, Stage::Processing])?;
        self.error = Some(message.into());
        self.stage = Stage::Error;
        Ok(())
    }

    /// AnalysisCompleted → Processing.
    pub fn begin_optimization(
        &mut self,
        instructions: Option<String>,
    ) -> Result<OptimizationJob, PipelineError> {
        self.expect_stage("optimize", &[Stage::AnalysisCompleted])?;
        let Some(upload) = self.upload.as_ref() else {
            return Err(PipelineError::InvalidTransition {
                action: "optimize without an uploaded document",
                stage: self.stage,
            });
        };
        let instructions = instructions
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let job = OptimizationJob {
            owner_id: self.owner_id.clone(),
            filename: upload.filename.clone(),
            document: DocumentInput {
                bytes: upload.bytes.clone(),
                mime_type: upload.mime_type.clone(),
            },
            language: self.language,
            instructions: instructions.clone(),
        };
        self.instructions = instructions;
        self.error = None;
        self.stage = Stage::Processing;
        Ok(job)
    }

    /// Processing → Completed.
    pub fn complete(&mut self, document: CompletedDocument) -> Result<(), PipelineError> {
        self.expect_stage("complete optimization", &[Stage::Processing])?;
        self.install_document(document);
        Ok(())
    }

    /// Idle → Completed, straight from a history record.
    pub fn resume(&mut self, document: CompletedDocument) -> Result<(), PipelineError> {
        self.expect_stage("open a history record", &[Stage::Idle])?;
        self.install_document(document);
        Ok(())
    }

    fn install_document(&mut self, document: CompletedDocument) {
        self.payment_step = if document.unlocked {
            PaymentStep::Success
        } else {
            PaymentStep::Details
        };
        self.document = Some(document);
        self.stage = Stage::Completed;
    }

    /// Back to Idle with every per-document field cleared.
    pub fn reset(&mut self) -> Result<(), PipelineError> {
        if self.is_busy() {
            return Err(PipelineError::InvalidTransition {
                action: "reset",
                stage: self.stage,
            });
        }
        self.stage = Stage::Idle;
        self.upload = None;
        self.instructions = None;
        self.analysis = None;
        self.document = None;
        self.payment_step = PaymentStep::Details;
        self.pending_payment = None;
        self.error = None;
        Ok(())
    }

    /// The completed document, only if it is unlocked.
    pub fn unlocked_document(&self) -> Result<&CompletedDocument, PipelineError> {
        self.expect_stage("export", &[Stage::Completed])?;
        match self.document.as_ref() {
            Some(doc) if doc.unlocked => Ok(doc),
            Some(_) => Err(PipelineError::Locked),
            None => Err(PipelineError::InvalidTransition {
                action: "export without a document",
                stage: self.stage,
            }),
        }
    }

    /// details → processing.
    pub fn begin_payment(&mut self) -> Result<PaymentStart, PipelineError> {
        self.expect_stage("pay", &[Stage::Completed])?;
        let Some(document) = self.document.as_ref() else {
            return Err(PipelineError::InvalidTransition {
                action: "pay without a document",
                stage: self.stage,
            });
        };
        if document.unlocked {
            return Ok(PaymentStart::AlreadyUnlocked);
        }
        if self.pending_payment.is_some() {
            return Err(PipelineError::InvalidTransition {
                action: "start a second payment",
                stage: self.stage,
            });
        }
        let ticket = Uuid::new_v4();
        let start = PaymentStart::Started {
            ticket,
            record_id: document.record_id,
            order_number: document.order_number.clone(),
        };
        self.pending_payment = Some(ticket);
        self.payment_step = PaymentStep::Processing;
        Ok(start)
    }

    /// processing → success. Unlocks the document the charge was started for
    /// and returns its record id to persist the paid flag against.
    pub fn payment_settled(&mut self, ticket: Uuid) -> Result<Option<Uuid>, PipelineError> {
        let document = match self.document.as_mut() {
            Some(document) if self.pending_payment == Some(ticket) => document,
            _ => {
                return Err(PipelineError::InvalidTransition {
                    action: "settle a payment that is not pending",
                    stage: self.stage,
                })
            }
        };
        document.unlocked = true;
        self.pending_payment = None;
        self.payment_step = PaymentStep::Success;
        Ok(document.record_id)
    }

    /// Back to `details` so the user can try again. Never relocks.
    pub fn payment_failed(&mut self, ticket: Uuid) {
        if self.pending_payment != Some(ticket) {
            return;
        }
        self.pending_payment = None;
        let unlocked = self.document.as_ref().is_some_and(|d| d.unlocked);
        if !unlocked {
            self.payment_step = PaymentStep::Details;
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            stage: self.stage,
            output_language: self.language,
            busy: self.is_busy(),
            filename: self.upload.as_ref().map(|u| u.filename.clone()).or_else(|| {
                self.document.as_ref().map(|d| d.filename.clone())
            }),
            instructions: self.instructions.clone(),
            analysis: self.analysis.clone(),
            document: self.document.as_ref().map(|d| DocumentView {
                record_id: d.record_id,
                order_number: d.order_number.clone(),
                filename: d.filename.clone(),
                unlocked: d.unlocked,
                blurred: !d.unlocked,
                preview_html: d.html.clone(),
            }),
            payment_step: self.payment_step,
            error: self.error.clone(),
        }
    }
}
