#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::future::BoxFuture;
use salewallet::db::WalletStorage;
use salewallet::mail::{MailSender, OutgoingMail};
use salewallet::{AppState, Config, WalletError, wallet_router};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;
use tower::ServiceExt;

/// Captures every mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

impl MailSender for RecordingMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .expect("mailer lock poisoned")
                .push(mail.clone());
            Ok(())
        })
    }
}

/// Always fails, like an unreachable relay.
pub struct FailingMailer;

impl MailSender for FailingMailer {
    fn send<'a>(&'a self, _mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async { Err(WalletError::MailDelivery("relay unreachable".to_string())) })
    }
}

/// Records mail after sleeping, like a sluggish relay.
pub struct SlowMailer {
    pub inner: Arc<RecordingMailer>,
    pub delay: Duration,
}

impl MailSender for SlowMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.send(mail).await
        })
    }
}

/// Holds callers in `ready` while armed, like an exhausted quota.
pub struct GatedMailer {
    inner: Arc<RecordingMailer>,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedMailer {
    pub fn new(inner: Arc<RecordingMailer>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl MailSender for GatedMailer {
    fn ready(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.armed.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
        })
    }

    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), WalletError>> {
        self.inner.send(mail)
    }
}

pub struct TestApp {
    pub app: Router,
    pub storage: WalletStorage,
    pub config: Config,
    pub mailer: Arc<RecordingMailer>,
    db_path: PathBuf,
    upload_dir: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body was not JSON")
    }

    pub fn code(&self) -> String {
        self.json()["code"].as_str().unwrap_or_default().to_string()
    }
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    format!("{}-{}", std::process::id(), nanos)
}

pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.auth.access_secret = "test-access-secret".to_string();
    cfg.auth.refresh_secret = "test-refresh-secret".to_string();
    cfg.server.public_url = "http://wallet.test".parse().expect("valid url");
    cfg.server.max_picture_bytes = 1024;
    cfg
}

impl TestApp {
    pub async fn spawn() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::spawn_with(test_config(), mailer.clone(), mailer).await
    }

    /// Build the app around `sender`; `recorder` is what tests inspect.
    pub async fn spawn_with(
        mut config: Config,
        recorder: Arc<RecordingMailer>,
        sender: Arc<dyn MailSender>,
    ) -> Self {
        let suffix = unique_suffix();
        let mut db_path = std::env::temp_dir();
        db_path.push(format!("salewallet-test-{suffix}.sqlite"));
        let mut upload_dir = std::env::temp_dir();
        upload_dir.push(format!("salewallet-uploads-{suffix}"));

        config.database.url = format!("sqlite:{}", db_path.display());
        config.server.upload_dir = upload_dir.clone();

        let storage = WalletStorage::connect(&config.database.url)
            .await
            .expect("failed to open test database");
        storage
            .init_schema()
            .await
            .expect("failed to init schema");

        let state = AppState::new(storage.clone(), config.clone(), sender);
        Self {
            app: wallet_router(state),
            storage,
            config,
            mailer: recorder,
            db_path,
            upload_dir,
        }
    }

    pub async fn failing_mail() -> Self {
        let recorder = Arc::new(RecordingMailer::default());
        Self::spawn_with(test_config(), recorder, Arc::new(FailingMailer)).await
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("request failed");
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        TestResponse {
            status,
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
            bytes: body.to_vec(),
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    pub async fn register(&self, username: &str, mail: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/v1/user/register",
            None,
            Some(serde_json::json!({
                "username": username,
                "mail": mail,
                "password": password,
            })),
        )
        .await
    }

    /// `(user_id, token)` parsed from the most recent confirmation link.
    pub fn last_confirmation(&self) -> (String, String) {
        let mail = self
            .mailer
            .sent()
            .pop()
            .expect("no confirmation mail sent");
        let link = mail
            .text_body
            .lines()
            .find(|l| l.contains("/confirm-email?token="))
            .expect("mail has no confirmation link")
            .trim()
            .to_string();
        let (path, token) = link
            .split_once("/confirm-email?token=")
            .expect("malformed link");
        let user_id = path.rsplit('/').next().expect("link has no user id");
        (user_id.to_string(), token.to_string())
    }

    pub async fn confirm(&self, user_id: &str, token: &str) -> TestResponse {
        self.request(
            "GET",
            &format!("/api/v1/user/{user_id}/confirm-email?token={token}"),
            None,
            None,
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/v1/user/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Register, confirm and log in; returns `(user_id, access, refresh)`.
    pub async fn signed_in(&self, username: &str) -> (String, String, String) {
        let mail = format!("{username}@example.com");
        let resp = self.register(username, &mail, "secret-pass").await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        let (user_id, token) = self.last_confirmation();
        let resp = self.confirm(&user_id, &token).await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        let resp = self.login(username, "secret-pass").await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        let json = resp.json();
        (
            user_id,
            json["tokens"]["accessToken"]
                .as_str()
                .expect("access token")
                .to_string(),
            json["tokens"]["refreshToken"]
                .as_str()
                .expect("refresh token")
                .to_string(),
        )
    }

    pub async fn count(&self, sql: &str, bind: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(bind)
            .fetch_one(self.storage.pool())
            .await
            .expect("count query failed")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
