//! Async client for the remote OTP service.
//!
//! # Responsibilities
//! - Substitute the default directory before a body is signed
//! - Sign every call (application ID, epoch, request secret, remote IP headers)
//! - Verify signed envelopes; anything untrusted becomes `AuthOutcome::Unverified`
//!
//! # Concurrency
//! The client is cheap to clone and holds no mutable state. Each call captures
//! its own epoch and signature, so any number of calls may be in flight. Calls
//! are plain futures: drop one to cancel it, or wrap it in
//! `tokio::time::timeout` to bound it. No retries are performed.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::credentials::Credentials;
use crate::client::endpoints::{self, qualified_user_name};
use crate::client::types::{
    AuthOutcome, AuthorisationStateRequest, ClientError, ClientResult, RegisterUserRequest,
    RegisterUserResponse, StateResponse, VerifyOtpRequest,
};
use crate::config::{ConfigError, GateConfig};
use crate::observability::metrics;
use crate::signing::response::SignedFields;
use crate::signing::{
    epoch_now, sign_request, verify_envelope, ClockError, Rejection, SigningInput,
};

/// Everything needed to build an [`OtpClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base origin of the service.
    pub base_url: Url,
    pub credentials: Credentials,
    /// Directory substituted into requests that do not name one.
    pub directory_name: Option<String>,
    /// Remote IP presented with every call unless a request overrides it.
    pub remote_ip: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl ClientSettings {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            directory_name: None,
            remote_ip: None,
            connect_timeout: None,
            request_timeout: None,
        }
    }

    /// Build from a loaded configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, ConfigError> {
        let service = &config.service;
        let base_url = Url::parse(&service.base_url).map_err(|e| {
            ConfigError::Validation(vec![crate::config::ValidationError::InvalidBaseUrl {
                url: service.base_url.clone(),
                reason: e.to_string(),
            }])
        })?;

        Ok(Self {
            base_url,
            credentials: Credentials::from_config(service)?,
            directory_name: service.directory_name.clone(),
            remote_ip: service.remote_ip.clone(),
            connect_timeout: config.timeouts.connect_secs.map(Duration::from_secs),
            request_timeout: config.timeouts.request_secs.map(Duration::from_secs),
        })
    }
}

/// Client for the remote OTP service.
#[derive(Clone)]
pub struct OtpClient {
    http: Client,
    base_url: String,
    credentials: Arc<Credentials>,
    directory_name: Option<String>,
    remote_ip: Option<String>,
}

impl OtpClient {
    /// Create a new client.
    pub fn new(settings: ClientSettings) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        tracing::info!(
            base_url = %settings.base_url,
            application_id = settings.credentials.application_id(),
            directory = settings.directory_name.as_deref().unwrap_or(""),
            "OTP client initialized"
        );

        Ok(Self {
            http,
            base_url: settings.base_url.as_str().trim_end_matches('/').to_string(),
            credentials: Arc::new(settings.credentials),
            directory_name: settings.directory_name.filter(|d| !d.is_empty()),
            remote_ip: settings.remote_ip.filter(|ip| !ip.is_empty()),
        })
    }

    /// Create a client from a loaded configuration.
    pub fn from_config(config: &GateConfig) -> ClientResult<Self> {
        Self::new(ClientSettings::from_config(config)?)
    }

    /// Directory used when a request does not name one.
    pub fn default_directory(&self) -> Option<&str> {
        self.directory_name.as_deref()
    }

    /// Ask the service for a user's authentication state.
    ///
    /// Only an empty user name is an error; every service-side failure comes
    /// back as [`AuthOutcome::Unverified`].
    pub async fn request_authorisation_state(
        &self,
        mut request: AuthorisationStateRequest,
    ) -> ClientResult<AuthOutcome> {
        require(&request.user_name, "UserName")?;
        self.apply_default_directory(&mut request.directory_name);

        self.verified_call(
            "request_authorisation_state",
            endpoints::REQUEST_AUTHENTICATION_STATE,
            &request,
            &request.user_name,
            request.remote_ip.as_deref(),
            request.directory_name.as_deref(),
        )
        .await
    }

    /// Check a one-time password. Same contract as
    /// [`request_authorisation_state`](Self::request_authorisation_state).
    pub async fn verify_user_otp(&self, mut request: VerifyOtpRequest) -> ClientResult<AuthOutcome> {
        require(&request.user_name, "UserName")?;
        require(&request.otp, "OTP")?;
        self.apply_default_directory(&mut request.directory_name);

        self.verified_call(
            "verify_user_otp",
            endpoints::VERIFY_USER_OTP,
            &request,
            &request.user_name,
            request.remote_ip.as_deref(),
            request.directory_name.as_deref(),
        )
        .await
    }

    /// Enrol a user.
    ///
    /// The register endpoint returns no signed payload, so the response is not
    /// verified and transport or decoding failures are returned as errors.
    pub async fn register_user(
        &self,
        mut request: RegisterUserRequest,
    ) -> ClientResult<RegisterUserResponse> {
        require(&request.user_name, "UserName")?;
        self.apply_default_directory(&mut request.directory_name);

        let span = call_span("register_user", request.directory_name.as_deref());
        self.send_registration(&request).instrument(span).await
    }

    async fn send_registration(
        &self,
        request: &RegisterUserRequest,
    ) -> ClientResult<RegisterUserResponse> {
        let body = serde_json::to_string(request)?;
        let response = self
            .signed_request(Method::POST, endpoints::REGISTER_USER, &body, None)
            .inspect_err(|_| metrics::record_call("register_user", "clock_error"))?
            .body(body)
            .send()
            .await
            .inspect_err(|_| metrics::record_call("register_user", "transport_error"))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            metrics::record_call("register_user", "status_error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let decoded: RegisterUserResponse = serde_json::from_str(&text)
            .inspect_err(|_| metrics::record_call("register_user", "decode_error"))?;
        metrics::record_call("register_user", "ok");
        tracing::info!(state = %decoded.state, "User registration answered");
        Ok(decoded)
    }

    /// Remove a user. True iff the service answers 200 OK.
    pub async fn delete_user(&self, user_name: &str, directory: Option<&str>) -> bool {
        if user_name.is_empty() {
            tracing::warn!("delete_user called with an empty user name");
            return false;
        }

        let directory = directory
            .filter(|d| !d.is_empty())
            .or(self.directory_name.as_deref());
        let qualified = qualified_user_name(directory, user_name);

        let request = self
            .signed_request(Method::DELETE, endpoints::DELETE_USER, "", None)
            .map(|builder| builder.query(&[(endpoints::DELETE_USER_QUERY, qualified.as_str())]));

        self.status_probe("delete_user", request, directory).await
    }

    /// Liveness and credential probe. True iff the service answers 200 OK.
    pub async fn hello_world(&self) -> bool {
        let request = self.signed_request(Method::GET, endpoints::HELLO_WORLD, "", None);
        self.status_probe("hello_world", request, None).await
    }

    fn apply_default_directory(&self, directory: &mut Option<String>) {
        if directory.as_deref().map_or(true, str::is_empty) {
            *directory = self.directory_name.clone();
        }
    }

    /// Build a request carrying the signing headers for `body`.
    fn signed_request(
        &self,
        method: Method,
        path: &str,
        body: &str,
        remote_ip: Option<&str>,
    ) -> Result<RequestBuilder, ClockError> {
        let remote_ip = remote_ip
            .filter(|ip| !ip.is_empty())
            .or(self.remote_ip.as_deref());

        let signature = sign_request(
            &SigningInput {
                application_id: self.credentials.application_id(),
                epoch: epoch_now()?,
                application_key: self.credentials.application_key(),
                body,
                remote_ip,
            },
            self.credentials.api_key().as_bytes(),
        );

        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(endpoints::HEADER_APPLICATION_ID, signature.application_id.to_string())
            .header(endpoints::HEADER_EPOCH, signature.epoch.to_string())
            .header(endpoints::HEADER_REQUEST_SECRET, signature.request_secret);

        if let Some(ip) = signature.remote_ip {
            builder = builder.header(endpoints::HEADER_REMOTE_IP, ip);
        }
        if !body.is_empty() {
            builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
        }
        Ok(builder)
    }

    async fn verified_call<B: Serialize>(
        &self,
        operation: &'static str,
        path: &str,
        request: &B,
        identity: &str,
        remote_ip: Option<&str>,
        directory: Option<&str>,
    ) -> ClientResult<AuthOutcome> {
        let body = serde_json::to_string(request)?;
        let builder = self
            .signed_request(Method::POST, path, &body, remote_ip)
            .map(|builder| builder.body(body));

        let outcome = async {
            let fetched = match builder {
                Ok(builder) => self.fetch_envelope(builder).await,
                Err(e) => Err(Rejection::Clock(e)),
            };
            let outcome = match fetched {
                Ok(envelope) => self.verify(identity, envelope, epoch_now()),
                Err(rejection) => AuthOutcome::Unverified(rejection),
            };

            match &outcome {
                AuthOutcome::Verified(envelope) => {
                    metrics::record_call(operation, "verified");
                    tracing::debug!(state = %envelope.state, "Response verified");
                }
                AuthOutcome::Unverified(rejection) => {
                    metrics::record_call(operation, "unverified");
                    metrics::record_rejection(rejection.reason());
                    tracing::warn!(
                        reason = rejection.reason(),
                        error = %rejection,
                        "Response not verified; treating as INVALID"
                    );
                }
            }
            outcome
        }
        .instrument(call_span(operation, directory))
        .await;

        Ok(outcome)
    }

    async fn fetch_envelope(&self, request: RequestBuilder) -> Result<StateResponse, Rejection> {
        let response = request
            .send()
            .await
            .map_err(|e| Rejection::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Rejection::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Rejection::Transport(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| Rejection::Malformed(e.to_string()))
    }

    fn verify(
        &self,
        identity: &str,
        envelope: StateResponse,
        now: Result<i64, ClockError>,
    ) -> AuthOutcome {
        let now = match now {
            Ok(now) => now,
            Err(e) => return AuthOutcome::Unverified(Rejection::Clock(e)),
        };

        let fields = SignedFields {
            identity,
            state: envelope.state.as_str(),
            random_token: &envelope.random_token,
            signed_time: envelope.signed_time,
            signed_response: &envelope.signed_response,
        };

        match verify_envelope(&fields, self.credentials.application_key().as_bytes(), now) {
            Ok(()) => AuthOutcome::Verified(envelope),
            Err(rejection) => AuthOutcome::Unverified(rejection),
        }
    }

    async fn status_probe(
        &self,
        operation: &'static str,
        request: Result<RequestBuilder, ClockError>,
        directory: Option<&str>,
    ) -> bool {
        async {
            let request = match request {
                Ok(request) => request,
                Err(e) => {
                    metrics::record_call(operation, "clock_error");
                    tracing::warn!(error = %e, "Cannot sign request");
                    return false;
                }
            };
            match request.send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    metrics::record_call(operation, "ok");
                    true
                }
                Ok(response) => {
                    metrics::record_call(operation, "status_error");
                    tracing::warn!(status = %response.status(), "Service refused request");
                    false
                }
                Err(e) => {
                    metrics::record_call(operation, "transport_error");
                    tracing::warn!(error = %e, "Service unreachable");
                    false
                }
            }
        }
        .instrument(call_span(operation, directory))
        .await
    }
}

impl std::fmt::Debug for OtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpClient")
            .field("base_url", &self.base_url)
            .field("application_id", &self.credentials.application_id())
            .field("directory_name", &self.directory_name)
            .field("remote_ip", &self.remote_ip)
            .finish()
    }
}

fn require(value: &str, field: &'static str) -> ClientResult<()> {
    if value.trim().is_empty() {
        Err(ClientError::MissingField(field))
    } else {
        Ok(())
    }
}

fn call_span(operation: &'static str, directory: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "otp_call",
        operation,
        request_id = %Uuid::new_v4(),
        directory = directory.unwrap_or("")
    )
}
