/// Email delivery for signup codes
use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const OTP_SUBJECT: &str = "EchoDraft - Your One-Time Password (OTP)";

/// Async SMTP transport, or no-op when no host is configured
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    log_codes: bool,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; signup codes will not be emailed");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

            let builder = match (&config.smtp_username, &config.smtp_password) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                }
                _ => builder,
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            log_codes: false,
        })
    }

    /// In no-op mode, write each code to the debug log so local signups can
    /// be verified. Never enable in production.
    pub fn with_code_logging(mut self, enabled: bool) -> Self {
        self.log_codes = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the signup code to `recipient`
    pub async fn send_otp(&self, recipient: &str, code: &str, ttl_minutes: i64) -> Result<()> {
        let (text, html) = otp_bodies(code, ttl_minutes);

        let Some(transport) = &self.transport else {
            if self.log_codes {
                debug!(
                    recipient = %super::auth::mask_email(recipient),
                    code,
                    "signup code (email delivery disabled)"
                );
            }
            info!(
                subject = OTP_SUBJECT,
                recipient = %super::auth::mask_email(recipient),
                "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid email address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(OTP_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        transport.send(message).await?;
        info!(subject = OTP_SUBJECT, "email sent");
        Ok(())
    }
}

fn otp_bodies(code: &str, ttl_minutes: i64) -> (String, String) {
    let text = format!(
        "Welcome to EchoDraft!\n\n\
         Your one-time password is: {code}\n\n\
         It expires in {ttl_minutes} minutes. If you did not request it, ignore this email."
    );
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    <h2>Welcome to EchoDraft</h2>
    <p>Your one-time password is:</p>
    <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</p>
    <p style="color: #999; font-size: 12px;">
        It expires in {ttl_minutes} minutes. If you did not request it, ignore this email.
    </p>
</body>
</html>"#
    );
    (text, html)
}
