//! Public contact form endpoint

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::services::admin::{error_from_folio, success_message};
use crate::services::{ContactService, ContactSubmission, SubmissionOutcome};

/// POST /api/contact
///
/// Honeypot hits return the same success body as real submissions.
pub async fn submit_contact(
    body: web::Json<ContactSubmission>,
    service: web::Data<Arc<ContactService>>,
) -> ActixResult<HttpResponse> {
    match service.submit(body.into_inner()).await {
        Ok(SubmissionOutcome::Persisted(_)) | Ok(SubmissionOutcome::HoneypotDropped) => Ok(
            success_message("Thanks for reaching out! I'll get back to you soon."),
        ),
        Err(e) => Ok(error_from_folio(&e)),
    }
}
