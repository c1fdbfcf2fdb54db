//! Notification e-mail job.
//!
//! Moderation notices are mirrored to the recipient's inbox. Without SMTP
//! settings the message is logged instead of sent.

use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::AppError;

/// Notification e-mail payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEmailJob {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl NotificationEmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

struct SmtpSettings {
    host: Option<String>,
    from: String,
}

impl SmtpSettings {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@community-hub.local".to_string()),
        }
    }
}

/// Processes one notification e-mail
pub async fn notification_email_handler(job: NotificationEmailJob) -> Result<(), AppError> {
    let smtp = SmtpSettings::from_env();

    tracing::info!(
        to = %job.to,
        subject = %job.subject,
        "Processing notification email"
    );

    match smtp.host {
        None => {
            tracing::warn!("SMTP not configured - logging email instead of sending");
            tracing::info!(
                from = %smtp.from,
                to = %job.to,
                subject = %job.subject,
                body = %job.body,
                "Email not sent"
            );
        }
        Some(host) => {
            // TODO: deliver through an SMTP transport once one is added to the dependency set
            tracing::warn!(
                smtp_host = %host,
                to = %job.to,
                "SMTP host configured but no transport is available; email dropped"
            );
        }
    }

    Ok(())
}
