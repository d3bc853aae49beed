//! Blocking adapter over [`OtpClient`].
//!
//! Every method drives the matching async method to completion on a private
//! current-thread runtime. Do not call these from inside an async context;
//! use [`OtpClient`] there.

use tokio::runtime::{Builder, Runtime};

use crate::client::otp::OtpClient;
use crate::client::types::{
    AuthOutcome, AuthorisationStateRequest, ClientResult, RegisterUserRequest,
    RegisterUserResponse, VerifyOtpRequest,
};

/// Synchronous facade for callers without an async runtime.
pub struct BlockingOtpClient {
    inner: OtpClient,
    runtime: Runtime,
}

impl BlockingOtpClient {
    pub fn new(inner: OtpClient) -> ClientResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    /// The async client this adapter drives.
    pub fn inner(&self) -> &OtpClient {
        &self.inner
    }

    pub fn request_authorisation_state(
        &self,
        request: AuthorisationStateRequest,
    ) -> ClientResult<AuthOutcome> {
        self.runtime
            .block_on(self.inner.request_authorisation_state(request))
    }

    pub fn register_user(&self, request: RegisterUserRequest) -> ClientResult<RegisterUserResponse> {
        self.runtime.block_on(self.inner.register_user(request))
    }

    pub fn verify_user_otp(&self, request: VerifyOtpRequest) -> ClientResult<AuthOutcome> {
        self.runtime.block_on(self.inner.verify_user_otp(request))
    }

    pub fn delete_user(&self, user_name: &str, directory: Option<&str>) -> bool {
        self.runtime
            .block_on(self.inner.delete_user(user_name, directory))
    }

    pub fn hello_world(&self) -> bool {
        self.runtime.block_on(self.inner.hello_world())
    }
}

impl std::fmt::Debug for BlockingOtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingOtpClient")
            .field("inner", &self.inner)
            .finish()
    }
}
