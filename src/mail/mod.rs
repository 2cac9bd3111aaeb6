//! Outbound mail: transports behind [`MailSender`], throttled by a shared quota.

pub mod http;
pub mod log;
pub mod smtp;
pub mod templates;

use crate::config::{MailConfig, MailTransport};
use crate::error::WalletError;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

pub use http::HttpMailer;
pub use log::LogMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl OutgoingMail {
    /// Confirmation mail for a freshly (re-)registered account.
    pub fn confirmation(to_email: &str, username: &str, link: &str) -> Self {
        Self {
            to_email: to_email.to_string(),
            to_name: Some(username.to_string()),
            subject: templates::CONFIRMATION_SUBJECT.to_string(),
            html_body: templates::confirmation_html(username, link),
            text_body: templates::confirmation_text(username, link),
        }
    }
}

/// Delivery capability injected into request handlers.
pub trait MailSender: Send + Sync {
    /// Resolves once the next `send` can go out without waiting on the quota.
    ///
    /// Callers await this before taking locks the delivery would otherwise hold.
    fn ready(&self) -> BoxFuture<'_, ()> {
        future::ready(()).boxed()
    }

    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>>;
}

/// Waits for a quota slot before handing the mail to the inner transport.
///
/// A slot taken by [`MailSender::ready`] is reserved and consumed by the next
/// `send`, so the quota is charged once per mail either way.
pub struct ThrottledMailer<M> {
    inner: M,
    limiter: DefaultDirectRateLimiter,
    reserved: AtomicUsize,
}

impl<M: MailSender> ThrottledMailer<M> {
    pub fn new(inner: M, per_minute: NonZeroU32) -> Self {
        Self {
            inner,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            reserved: AtomicUsize::new(0),
        }
    }

    fn take_reserved(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl<M: MailSender> MailSender for ThrottledMailer<M> {
    fn ready(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.limiter.until_ready().await;
            self.reserved.fetch_add(1, Ordering::AcqRel);
        })
    }

    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            if !self.take_reserved() {
                self.limiter.until_ready().await;
            }
            self.inner.send(mail).await
        })
    }
}

/// Build the configured transport, wrapped in the per-minute throttle.
pub fn build_mailer(cfg: &MailConfig) -> Result<Arc<dyn MailSender>, WalletError> {
    let per_minute = NonZeroU32::new(cfg.max_per_minute).unwrap_or(NonZeroU32::MIN);
    info!(transport = ?cfg.transport, per_minute = per_minute.get(), "mail transport configured");
    let mailer: Arc<dyn MailSender> = match cfg.transport {
        MailTransport::Log => Arc::new(ThrottledMailer::new(LogMailer, per_minute)),
        MailTransport::Smtp => Arc::new(ThrottledMailer::new(SmtpMailer::new(cfg)?, per_minute)),
        MailTransport::Http => Arc::new(ThrottledMailer::new(HttpMailer::new(cfg)?, per_minute)),
    };
    Ok(mailer)
}
