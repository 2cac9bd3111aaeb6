use super::{MailSender, OutgoingMail};
use crate::config::MailConfig;
use crate::error::WalletError;
use futures::future::BoxFuture;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// STARTTLS SMTP relay with login credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, WalletError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .map_err(delivery)?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                cfg.smtp_username.clone(),
                cfg.smtp_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        let from = mailbox(Some(&cfg.from_name), &cfg.from_email)?;
        Ok(Self { transport, from })
    }
}

impl MailSender for SmtpMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            let message = Message::builder()
                .from(self.from.clone())
                .to(mailbox(mail.to_name.as_deref(), &mail.to_email)?)
                .subject(mail.subject.clone())
                .multipart(MultiPart::alternative_plain_html(
                    mail.text_body.clone(),
                    mail.html_body.clone(),
                ))
                .map_err(delivery)?;
            let response = self.transport.send(message).await.map_err(delivery)?;
            debug!(to = %mail.to_email, code = %response.code(), "smtp relay accepted mail");
            Ok(())
        })
    }
}

fn mailbox(name: Option<&str>, email: &str) -> Result<Mailbox, WalletError> {
    let address = email.parse().map_err(delivery)?;
    Ok(Mailbox::new(name.map(str::to_owned), address))
}

fn delivery(e: impl std::fmt::Display) -> WalletError {
    WalletError::MailDelivery(e.to_string())
}

