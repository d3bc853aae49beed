//! Shared utilities for integration tests: an in-process stub OTP service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use url::Url;

use otp_gate::client::endpoints::{
    HEADER_APPLICATION_ID, HEADER_EPOCH, HEADER_REMOTE_IP, HEADER_REQUEST_SECRET,
};
use otp_gate::client::{ClientSettings, Credentials, OtpClient};
use otp_gate::signing::response::response_signature;
use otp_gate::signing::{epoch_now, sign_request, SigningInput};

pub const APP_ID: i64 = 4242;
pub const APP_KEY: &str = "application-key-for-tests";
pub const API_KEY: &str = "api-key-for-tests";

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Recompute the request secret the way the service does.
    pub fn request_secret_is_valid(&self, app_id: i64, app_key: &str, api_key: &str) -> bool {
        let Some(epoch) = self.header(HEADER_EPOCH).and_then(|e| e.parse().ok()) else {
            return false;
        };
        if self.header(HEADER_APPLICATION_ID) != Some(app_id.to_string().as_str()) {
            return false;
        }
        let expected = sign_request(
            &SigningInput {
                application_id: app_id,
                epoch,
                application_key: app_key,
                body: &self.body,
                remote_ip: self.header(HEADER_REMOTE_IP),
            },
            api_key.as_bytes(),
        );
        self.header(HEADER_REQUEST_SECRET) == Some(expected.request_secret.as_str())
    }

    /// User name from a JSON body.
    pub fn user_name(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v["UserName"].as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

type Responder = dyn Fn(&Captured) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct StubState {
    captured: Arc<Mutex<Vec<Captured>>>,
    responder: Arc<Responder>,
    delay: Duration,
}

/// A running stub service.
pub struct StubService {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl StubService {
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Captured {
        self.requests().pop().expect("stub received no request")
    }
}

async fn handle(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let captured = Captured {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
            .collect(),
        body,
    };
    state.captured.lock().unwrap().push(captured.clone());

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = (state.responder)(&captured);
    (StatusCode::from_u16(status).unwrap(), body)
}

/// Start a stub on an ephemeral port whose replies come from `responder`.
pub async fn start_stub<F>(responder: F) -> StubService
where
    F: Fn(&Captured) -> (u16, String) + Send + Sync + 'static,
{
    start_slow_stub(Duration::ZERO, responder).await
}

/// Like [`start_stub`], but waits `delay` before answering.
pub async fn start_slow_stub<F>(delay: Duration, responder: F) -> StubService
where
    F: Fn(&Captured) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let state = StubState {
        captured: captured.clone(),
        responder: Arc::new(responder),
        delay,
    };
    let app = Router::new().fallback(handle).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubService { addr, captured }
}

/// Signed state envelope as the real service would produce it.
pub fn signed_envelope(user: &str, state: &str, signed_time: i64) -> String {
    envelope_with_key(APP_KEY, user, state, signed_time)
}

/// Signed state envelope using an arbitrary application key.
pub fn envelope_with_key(app_key: &str, user: &str, state: &str, signed_time: i64) -> String {
    let token = format!("token-{}", signed_time);
    let signature = response_signature(app_key.as_bytes(), user, state, &token, signed_time);
    serde_json::json!({
        "State": state,
        "SignedResponse": signature,
        "RandomToken": token,
        "SignedTime": signed_time,
    })
    .to_string()
}

/// Responder that checks the request secret, then answers `state` signed now.
///
/// A request with a bad secret gets an envelope signed with the wrong key.
pub fn honest_service(
    state: &'static str,
) -> impl Fn(&Captured) -> (u16, String) + Send + Sync + 'static {
    move |req| {
        let user = req.user_name();
        if req.request_secret_is_valid(APP_ID, APP_KEY, API_KEY) {
            (200, signed_envelope(&user, state, epoch_now().unwrap()))
        } else {
            (200, envelope_with_key("not-the-application-key", &user, state, epoch_now().unwrap()))
        }
    }
}

pub fn settings(stub: &StubService) -> ClientSettings {
    ClientSettings::new(stub.base_url(), Credentials::new(APP_ID, APP_KEY, API_KEY))
}

pub fn client(stub: &StubService) -> OtpClient {
    OtpClient::new(settings(stub)).unwrap()
}
