use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
};

use crate::{
    error::AppError,
    session::{SessionId, SessionMessages},
    validation::Severity,
    AppState,
};

struct MessageLine {
    css_class: &'static str,
    field: String,
    message: String,
}

// Message area under the filter: validation hints, "nothing found", refresh failures
#[derive(Template)]
#[template(path = "messages.html")]
struct MessagesTemplate {
    lines: Vec<MessageLine>,
    empty: bool,
    has_notification: bool,
    notification: String,
}

impl From<SessionMessages> for MessagesTemplate {
    fn from(messages: SessionMessages) -> Self {
        let lines = messages
            .annotations
            .into_iter()
            .map(|annotation| MessageLine {
                // Red blocks the refresh, blue is informational
                css_class: match annotation.severity {
                    Severity::Error => "is-red",
                    Severity::Warning => "is-blue",
                },
                field: annotation.field_id.to_string(),
                message: annotation.message,
            })
            .collect();
        Self {
            lines,
            empty: messages.empty,
            has_notification: messages.notification.is_some(),
            notification: messages.notification.map(|n| n.message).unwrap_or_default(),
        }
    }
}

pub async fn messages(
    State(app_state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let handle = app_state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Filter session {} not found", id)))?;
    let template = MessagesTemplate::from(handle.messages().await?);
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render messages template: {}", e);
            Err(AppError::InternalServerError(anyhow::Error::new(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bound, FieldId, RangeKind};
    use crate::validation::ValidationAnnotation;

    #[test]
    fn renders_annotations_and_empty_state() {
        let messages = SessionMessages {
            annotations: vec![ValidationAnnotation {
                field_id: FieldId::new(RangeKind::Price, Bound::Max),
                severity: Severity::Error,
                message: "Maximum price must be greater than the minimum".into(),
            }],
            empty: true,
            notification: None,
        };

        let html = MessagesTemplate::from(messages).render().unwrap();

        assert!(html.contains("is-red"));
        assert!(html.contains("data-field=\"price.max\""));
        assert!(html.contains("Maximum price must be greater than the minimum"));
        assert!(html.contains("Nothing found"));
        assert!(!html.contains("notification"));
    }
}
