//! Drives a session through its gateway and store calls.
//!
//! Each operation follows the same shape: lock, transition, unlock; await the
//! remote call; lock again and record the outcome. Nothing here awaits while
//! holding the session mutex.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::AiGateway;
use crate::models::optimization::NewOptimization;
use crate::paywall::PaywallPolicy;
use crate::pipeline::session::{CompletedDocument, SessionView, Stage, UploadedDocument};
use crate::pipeline::sessions::SessionHandle;
use crate::pipeline::upload::validate_upload;
use crate::store::RecordStore;

/// Idle → Analyzing → AnalysisCompleted | Error.
///
/// Invalid uploads are rejected before the session moves, so no gateway call
/// is made and the session stays `Idle`.
pub async fn run_analysis(
    gateway: &dyn AiGateway,
    handle: &SessionHandle,
    upload: UploadedDocument,
) -> Result<SessionView, AppError> {
    let (session_id, document, language) = {
        let mut session = handle.lock().await;
        session.expect_stage("upload a document", &[Stage::Idle])?;
        validate_upload(&upload, session.language())?;
        info!(
            "Session {}: analyzing '{}' ({}, {} bytes)",
            session.id(),
            upload.filename,
            upload.mime_type,
            upload.bytes.len()
        );
        let document = session.begin_analysis(upload)?;
        (session.id(), document, session.language())
    };

    let result = gateway.analyze(&document, language).await;

    let mut session = handle.lock().await;
    match result {
        Ok(report) => {
            info!("Session {session_id}: analysis complete, score {}", report.score);
            session.complete_analysis(report)?;
            Ok(session.view())
        }
        Err(e) => {
            warn!("Session {session_id}: analysis failed: {e}");
            session.fail(e.to_string())?;
            Err(e.into())
        }
    }
}

/// AnalysisCompleted → Processing → Completed | Error.
///
/// For signed-in owners the most recent record for the same filename is
/// reused instead of calling the model again, paid flag included.
pub async fn run_optimization(
    gateway: &dyn AiGateway,
    store: &dyn RecordStore,
    paywall: PaywallPolicy,
    handle: &SessionHandle,
    instructions: Option<String>,
) -> Result<SessionView, AppError> {
    let (session_id, job) = {
        let mut session = handle.lock().await;
        let job = session.begin_optimization(instructions)?;
        (session.id(), job)
    };

    if let Some(owner_id) = job.owner_id.as_deref() {
        match store.find_recent(owner_id, &job.filename).await {
            Ok(Some(record)) => {
                info!(
                    "Session {session_id}: reusing optimization {} for '{}', skipping AI call",
                    record.id, job.filename
                );
                let mut session = handle.lock().await;
                session.complete(CompletedDocument::from_record(&record, paywall))?;
                return Ok(session.view());
            }
            Ok(None) => {}
            Err(e) => warn!("Session {session_id}: record lookup failed, optimizing anyway: {e}"),
        }
    }

    info!(
        "Session {session_id}: optimizing '{}' ({:?}, instructions: {})",
        job.filename,
        job.language,
        job.instructions.is_some()
    );
    let html = match gateway
        .optimize(&job.document, job.language, job.instructions.as_deref())
        .await
    {
        Ok(html) => html,
        Err(e) => {
            warn!("Session {session_id}: optimization failed: {e}");
            handle.lock().await.fail(e.to_string())?;
            return Err(e.into());
        }
    };

    let mut document = CompletedDocument {
        html,
        filename: job.filename.clone(),
        record_id: None,
        order_number: None,
        unlocked: paywall.is_unlocked(false),
    };

    if let Some(owner_id) = job.owner_id {
        let new = NewOptimization {
            owner_id,
            original_filename: job.filename,
            html_content: document.html.clone(),
            is_paid: paywall.initial_paid(),
        };
        match store.create(new).await {
            Ok(record) => {
                document.record_id = Some(record.id);
                document.order_number = Some(record.order_number);
            }
            Err(e) => warn!("Session {session_id}: result not persisted: {e}"),
        }
    }

    let mut session = handle.lock().await;
    session.complete(document)?;
    Ok(session.view())
}

/// Idle → Completed from a stored record owned by `owner_id`.
pub async fn resume_from_history(
    store: &dyn RecordStore,
    paywall: PaywallPolicy,
    handle: &SessionHandle,
    owner_id: &str,
    record_id: Uuid,
) -> Result<SessionView, AppError> {
    handle
        .lock()
        .await
        .expect_stage("open a history record", &[Stage::Idle])?;

    let record = store
        .get(record_id)
        .await?
        .filter(|record| record.owner_id == owner_id)
        .ok_or_else(|| AppError::NotFound(format!("Optimization {record_id} not found")))?;

    let mut session = handle.lock().await;
    session.resume(CompletedDocument::from_record(&record, paywall))?;
    info!("Session {}: resumed optimization {}", session.id(), record.id);
    Ok(session.view())
}
