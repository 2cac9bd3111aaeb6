use super::{MailSender, OutgoingMail};
use crate::config::MailConfig;
use crate::error::WalletError;
use backon::{ExponentialBuilder, Retryable};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

#[derive(Debug, ThisError)]
enum AttemptError {
    #[error("mail API unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("mail API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Transactional mail API client (Brevo-compatible JSON payload, `api-key` header).
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl HttpMailer {
    pub fn new(cfg: &MailConfig) -> Result<Self, WalletError> {
        let endpoint = cfg.http_endpoint.clone().ok_or_else(|| {
            WalletError::MailDelivery("mail.http_endpoint is not configured".to_string())
        })?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("salewallet/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| WalletError::MailDelivery(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: cfg.http_api_key.clone(),
            from_email: cfg.from_email.clone(),
            from_name: cfg.from_name.clone(),
        })
    }

    fn body(&self, mail: &OutgoingMail) -> SendEmailBody {
        SendEmailBody {
            sender: EmailAddress {
                email: self.from_email.clone(),
                name: Some(self.from_name.clone()).filter(|n| !n.is_empty()),
            },
            to: vec![EmailAddress {
                email: mail.to_email.clone(),
                name: mail.to_name.clone(),
            }],
            subject: mail.subject.clone(),
            html_content: mail.html_body.clone(),
            text_content: mail.text_body.clone(),
        }
    }

    async fn attempt(&self, body: &SendEmailBody) -> Result<(), AttemptError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AttemptError::Status { status, body })
    }
}

impl MailSender for HttpMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            let body = self.body(mail);
            (|| async { self.attempt(&body).await })
                .retry(default_retry_policy())
                .when(|e: &AttemptError| e.is_retryable())
                .notify(|err, dur: Duration| {
                    warn!("mail API retrying after error {}, sleeping {:?}", err, dur);
                })
                .await
                .map_err(|e| WalletError::MailDelivery(e.to_string()))?;
            debug!(to = %mail.to_email, "mail API accepted mail");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailTransport;

    #[test]
    fn payload_uses_camel_case_fields() {
        let cfg = MailConfig {
            transport: MailTransport::Http,
            http_endpoint: Some(Url::parse("https://mail.example.com/v3/smtp/email").unwrap()),
            http_api_key: "key".to_string(),
            ..MailConfig::default()
        };
        let mailer = HttpMailer::new(&cfg).unwrap();
        let mail = OutgoingMail {
            to_email: "bob@example.com".to_string(),
            to_name: Some("bob".to_string()),
            subject: "s".to_string(),
            html_body: "<p>h</p>".to_string(),
            text_body: "t".to_string(),
        };
        let json = serde_json::to_value(mailer.body(&mail)).unwrap();
        assert_eq!(json["sender"]["name"], "SaleWallet");
        assert_eq!(json["to"][0]["email"], "bob@example.com");
        assert_eq!(json["htmlContent"], "<p>h</p>");
        assert_eq!(json["textContent"], "t");
    }
}
