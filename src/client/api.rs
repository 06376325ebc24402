use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    AckResponse, AuthenticateRequest, AuthenticateResponse, CreateUserRequest, SendOtpRequest,
    SendOtpResponse, SessionInfo, SignInRequest, SignInResponse, VerifyOtpRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// The remote directory, as seen by the client. Request and response shapes
/// are the wire contract; everything behind them (code generation, expiry,
/// hashing) is server-owned.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn send_otp(&self, req: &SendOtpRequest) -> Result<SendOtpResponse, ApiError>;
    async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<AckResponse, ApiError>;
    async fn create_user(&self, req: &CreateUserRequest) -> Result<AckResponse, ApiError>;
    async fn authenticate(&self, req: &AuthenticateRequest) -> Result<AuthenticateResponse, ApiError>;
    async fn sign_in(&self, req: &SignInRequest) -> Result<SignInResponse, ApiError>;
    async fn fetch_session(&self, token: &str) -> Result<SessionInfo, ApiError>;
    async fn sign_out(&self, token: &str) -> Result<(), ApiError>;
}

pub struct HttpDirectoryApi {
    client: Client,
    base_url: String,
}

impl HttpDirectoryApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl DirectoryApi for HttpDirectoryApi {
    async fn send_otp(&self, req: &SendOtpRequest) -> Result<SendOtpResponse, ApiError> {
        self.post_json("/api/auth/send-otp", req).await
    }

    async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<AckResponse, ApiError> {
        self.post_json("/api/auth/verify-otp", req).await
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<AckResponse, ApiError> {
        self.post_json("/api/auth/create-user", req).await
    }

    async fn authenticate(&self, req: &AuthenticateRequest) -> Result<AuthenticateResponse, ApiError> {
        self.post_json("/api/auth/authenticate", req).await
    }

    async fn sign_in(&self, req: &SignInRequest) -> Result<SignInResponse, ApiError> {
        self.post_json("/api/auth/sign-in", req).await
    }

    async fn fetch_session(&self, token: &str) -> Result<SessionInfo, ApiError> {
        let resp = self
            .client
            .get(format!("{}/api/auth/session", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(format!("{}/api/auth/session", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(())
    }
}
