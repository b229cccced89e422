//! Contact form route handler.
//!
//! The form lives on the home page and submits over HTMX; the response
//! replaces the form fragment, either cleared with a success notice or
//! re-filled with the visitor's input and an error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::api::types::ContactMessage;
use crate::state::AppState;

/// Contact form display data, shared by the home page and the fragment.
#[derive(Clone, Default)]
pub struct ContactFormView {
    pub name: String,
    pub email: String,
    pub message: String,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Contact form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/contact_form.html")]
pub struct ContactFormTemplate {
    pub form: ContactFormView,
}

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Minimal shape check: something before and after an `@`, and a dot in
/// the domain part.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Submit the contact form (HTMX).
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let filled = ContactFormView {
        name: form.name.clone(),
        email: form.email.clone(),
        message: form.message.clone(),
        notice: None,
        error: None,
    };

    if form.name.trim().is_empty() || form.message.trim().is_empty() {
        return ContactFormTemplate {
            form: ContactFormView {
                error: Some("Please fill in all fields.".to_string()),
                ..filled
            },
        };
    }
    if !is_valid_email(form.email.trim()) {
        return ContactFormTemplate {
            form: ContactFormView {
                error: Some("Please enter a valid email address.".to_string()),
                ..filled
            },
        };
    }

    let message = ContactMessage {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        message: form.message.trim().to_string(),
    };

    match state.api().send_contact_message(&message).await {
        Ok(()) => ContactFormTemplate {
            form: ContactFormView {
                notice: Some("Thanks! Your message has been sent.".to_string()),
                ..ContactFormView::default()
            },
        },
        Err(e) => {
            tracing::error!("failed to send contact message: {e}");
            ContactFormTemplate {
                form: ContactFormView {
                    error: Some("Could not send your message right now. Please try again.".to_string()),
                    ..filled
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.co.ke"));

        assert!(!is_valid_email("janeexample.com"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane doe@example.com"));
    }
}
