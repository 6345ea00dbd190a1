//! Authenticated HTTP session
//!
//! One cookie store backs every request, so both product vendors share the
//! login. Requests that land on the login page after a successful login mean
//! the session expired; they fail with [`LottoError::NotAuthenticated`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lotto_core::config::Credentials;
use lotto_core::domain::Balance;
use lotto_core::retry::{RetryClassifiable, RetryConfig, with_retry};
use lotto_core::{LottoError, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::endpoints::Endpoints;
use crate::parse;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const LOGIN_MARKER: &str = "method=login";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct DhLotterySession {
    client: Client,
    endpoints: Endpoints,
    authenticated: AtomicBool,
    artifacts_dir: Option<PathBuf>,
}

impl DhLotterySession {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            authenticated: AtomicBool::new(false),
            artifacts_dir: None,
        })
    }

    /// Save unexpected pages under `dir` for later inspection.
    pub fn with_artifacts_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.artifacts_dir = dir;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Log in, retrying transient failures. Wrong credentials are never
    /// retried.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let config = RetryConfig::new(3, Duration::from_secs(2), Duration::from_secs(10))
            .with_should_retry(|err: &LottoError| {
                !matches!(err, LottoError::InvalidCredentials) && err.is_retryable()
            });

        with_retry(|| self.login_once(credentials), &config).await?;
        info!(username = %credentials.username, "logged in");
        Ok(())
    }

    async fn login_once(&self, credentials: &Credentials) -> Result<()> {
        // Session cookies are issued by the login page itself.
        self.client
            .get(self.endpoints.login_page())
            .send()
            .await?
            .error_for_status()?;

        let response = self
            .client
            .post(self.endpoints.login_action())
            .header(REFERER, self.endpoints.login_page())
            .form(&[
                ("returnUrl", self.endpoints.main_page().as_str()),
                ("userId", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("checkSave", "off"),
                ("newsEventYn", ""),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        if parse::login_failed(&body) {
            self.authenticated.store(false, Ordering::SeqCst);
            return Err(LottoError::InvalidCredentials);
        }

        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Fail fast when no login happened yet.
    pub fn require_auth(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(LottoError::NotAuthenticated)
        }
    }

    /// Deposit balance shown on my page.
    pub async fn fetch_balance(&self) -> Result<Balance> {
        self.require_auth()?;
        let html = self.get_html(&self.endpoints.balance_page(), &[]).await?;
        match parse::parse_balance(&html) {
            Some(balance) => Ok(balance),
            None => {
                self.dump_page("balance", &html).await;
                Err(LottoError::unexpected_page("reading the deposit balance"))
            }
        }
    }

    /// Refuse an order of `amount` KRW that the deposit cannot cover.
    ///
    /// A balance that cannot be read lets the order through; the vendor
    /// still refuses orders it cannot charge.
    pub async fn ensure_balance(&self, amount: u64) -> Result<()> {
        let balance = match self.fetch_balance().await {
            Ok(balance) => balance,
            Err(err) => {
                warn!(error = %err, "could not read the deposit balance, ordering anyway");
                return Ok(());
            }
        };

        if !balance.covers(amount) {
            warn!(
                available = balance.available,
                required = amount,
                "deposit does not cover the order"
            );
            return Err(LottoError::InsufficientBalance {
                required: amount,
                available: balance.available,
            });
        }
        debug!(available = balance.available, required = amount, "deposit covers the order");
        Ok(())
    }

    /// GET an HTML page.
    pub async fn get_html(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        self.check_session(url, &response)?;
        Ok(response.text().await?)
    }

    /// POST a form and decode the JSON answer.
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, String)],
        referer: &str,
    ) -> Result<T> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, JSON_ACCEPT)
            .header(REFERER, referer)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(form)
            .send()
            .await?
            .error_for_status()?;
        self.check_session(url, &response)?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            warn!(url, error = %err, "unexpected JSON response");
            LottoError::Parse {
                what: "JSON response",
                value: body.chars().take(200).collect(),
            }
        })
    }

    // A protected request redirected to the login form.
    fn check_session(&self, requested: &str, response: &Response) -> Result<()> {
        if !requested.contains(LOGIN_MARKER) && response.url().as_str().contains(LOGIN_MARKER) {
            self.authenticated.store(false, Ordering::SeqCst);
            return Err(LottoError::NotAuthenticated);
        }
        Ok(())
    }

    /// Write `body` to the artifacts directory, if one is configured.
    /// Failures are logged and otherwise ignored.
    pub async fn dump_page(&self, name: &str, body: &str) {
        let Some(dir) = &self.artifacts_dir else {
            return;
        };

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let path = dir.join(format!("{stamp}-{name}.html"));
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, body).await,
            Err(err) => Err(err),
        };

        match written {
            Ok(()) => info!(path = %path.display(), "saved unexpected page"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not save page"),
        }
    }
}
