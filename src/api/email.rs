//! Email send and template cache endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::models::{
    error_details, CacheClearData, CacheClearResponse, SendEmailData, SendEmailRequest,
    SendEmailResponse,
};
use crate::error::{AppError, Result};
use crate::metrics::DeliveryMetrics;
use crate::server::AppState;

/// POST /api/email/{template_key} - render a template and send it
#[tracing::instrument(name = "send_email", skip_all, fields(template = %template_key))]
pub async fn send_email(
    State(state): State<AppState>,
    Path(template_key): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    let Json(body) = payload.map_err(|rejection| {
        AppError::validation(json!([{"path": [], "message": rejection.body_text()}]))
    })?;

    let request = SendEmailRequest::from_value(body)
        .map_err(|errors| AppError::validation(error_details(&errors)))?;

    if !state.renderer.has_template(&template_key) {
        return Err(AppError::NotImplemented(format!(
            "Template not configured: {}",
            template_key
        )));
    }

    let html = state
        .renderer
        .render(&template_key, &request.locale, &request.data)?;

    let subject = match request.explicit_subject() {
        Some(subject) => subject.to_string(),
        None => state.renderer.subject(&request.locale, &template_key),
    };

    let locale = request.locale.clone();
    let email = request.into_email(subject, html);
    let recipients = email.recipient_count();

    let message_id = match state.mailer.send(email).await {
        Ok(id) => {
            DeliveryMetrics::record_sent(&template_key);
            id
        }
        Err(e) => {
            DeliveryMetrics::record_failed(&template_key);
            tracing::error!(locale = %locale, error = %e, "Failed to send email");
            return Err(e.into());
        }
    };

    tracing::info!(
        locale = %locale,
        recipients = recipients,
        message_id = %message_id,
        transport = state.mailer.name(),
        "Email sent successfully"
    );

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        data: SendEmailData { message_id },
    }))
}

/// POST /api/templates/cache/clear - drop compiled templates and reload partials
pub async fn clear_template_cache(State(state): State<AppState>) -> Result<Json<CacheClearResponse>> {
    let partials = state.renderer.clear_cache()?;

    Ok(Json(CacheClearResponse {
        success: true,
        data: CacheClearData { partials },
    }))
}
