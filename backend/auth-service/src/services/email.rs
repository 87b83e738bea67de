/// Outbound email: Mailer contract, SMTP implementation, templates
///
/// If SMTP host is empty, operates in no-op mode (logs only) and still
/// reports a synthetic delivery id. Useful for development and testing
/// without email infrastructure.
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EmailSettings;
use crate::error::{AuthError, Result};

/// One outbound message: plain text plus HTML alternative.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Fire-and-forget mail dispatch. Returns a delivery id on success;
/// callers decide whether a failure is fatal (explicit password-reset
/// requests) or merely logged (registration verification mail).
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<String>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                AuthError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<String> {
        let Some(transport) = &self.transport else {
            info!(
                subject = %message.subject,
                recipient = %mask_email(&message.to),
                "mailer running in no-op mode; skipping actual send"
            );
            return Ok(Uuid::new_v4().to_string());
        };

        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::EmailDelivery(format!("invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )
            .map_err(|e| AuthError::EmailDelivery(format!("failed to build message: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))?;

        let delivery_id = Uuid::new_v4().to_string();
        info!(subject = %message.subject, delivery_id = %delivery_id, "email sent");
        Ok(delivery_id)
    }
}

/// Mask an email address for logging.
pub(crate) fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let local = &email[..at_pos];
            let domain = &email[at_pos..];
            if local.len() <= 2 {
                format!("**{}", domain)
            } else {
                format!("{}***{}", &local[..1], domain)
            }
        }
        None => "***@***".to_string(),
    }
}

pub fn verify_email_message(to: &str, url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Verify your email address".to_string(),
        text: format!(
            "Welcome!\n\nPlease click the following link to verify your email address:\n{}\n\nIf you did not create this account, please ignore this email.",
            url
        ),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: sans-serif; padding: 20px; color: #333;">
    <h2>Verify your email address</h2>
    <p>Please click the button below to verify your email address:</p>
    <p style="margin: 30px 0;">
        <a href="{url}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 4px; display: inline-block;">Verify email</a>
    </p>
    <p style="color: #999; font-size: 12px;">
        If you did not create this account, please ignore this email.
    </p>
</body>
</html>"#
        ),
    }
}

pub fn password_reset_message(to: &str, url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Password reset request".to_string(),
        text: format!(
            "We received your password reset request.\n\nPlease click the following link to reset your password:\n{}\n\nThis link will expire in 1 hour.\nIf you did not request this, please ignore this email.",
            url
        ),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: sans-serif; padding: 20px; color: #333;">
    <h2>Password reset request</h2>
    <p>We received your password reset request.</p>
    <p style="margin: 30px 0;">
        <a href="{url}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 4px; display: inline-block;">Reset password</a>
    </p>
    <p style="color: #666; font-size: 14px;">This link will expire in <strong>1 hour</strong>.</p>
    <p style="color: #999; font-size: 12px;">
        If you did not request this, please ignore this email.
    </p>
</body>
</html>"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("not-an-email"), "***@***");
    }

    #[test]
    fn test_templates_embed_url() {
        let message = verify_email_message("alice@example.com", "https://app/verify/abc");
        assert!(message.text.contains("https://app/verify/abc"));
        assert!(message.html.contains("https://app/verify/abc"));

        let message = password_reset_message("alice@example.com", "https://app/reset?code=abc");
        assert!(message.text.contains("https://app/reset?code=abc"));
        assert!(message.html.contains("https://app/reset?code=abc"));
    }
}
