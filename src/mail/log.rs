use super::{MailSender, OutgoingMail};
use crate::error::WalletError;
use futures::future::BoxFuture;
use tracing::info;

/// Development transport: records the mail in the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl MailSender for LogMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            info!(
                to = %mail.to_email,
                subject = %mail.subject,
                body = %mail.text_body,
                "mail transport disabled; logging outgoing mail"
            );
            Ok(())
        })
    }
}
