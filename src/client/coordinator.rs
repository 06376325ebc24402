use crate::client::api::{ApiError, DirectoryApi};
use crate::client::session::{KeyValueStorage, SessionRecord, SessionStore};
use crate::i18n::{text, Locale, Msg};
use crate::models::{
    AuthenticateRequest, CreateUserRequest, OtpPurpose, SendOtpRequest, SignInRequest,
    VerifyOtpRequest,
};

/// Sink for user-visible status, standing in for the front-end toast layer.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Resend gate: 60 seconds, decremented by the shell's 1-second tick.
/// Owns no timer; the shell clears its interval on unmount.
#[derive(Debug, Default)]
pub struct ResendCooldown {
    remaining: u32,
}

pub const RESEND_COOLDOWN_SECS: u32 = 60;

impl ResendCooldown {
    pub fn start(&mut self) {
        self.remaining = RESEND_COOLDOWN_SECS;
    }

    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn ready(&self) -> bool {
        self.remaining == 0
    }
}

/// Transient registration form state. Validated before any network call.
#[derive(Debug, Default, Clone)]
pub struct RegistrationDraft {
    pub invite_code: Option<String>,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationDraft {
    pub fn validate(&self, locale: Locale) -> Result<(), &'static str> {
        if self.phone_number.is_empty() || self.password.is_empty() {
            return Err(text(locale, Msg::RequiredFields));
        }
        if self.password != self.confirm_password {
            return Err(text(locale, Msg::PasswordMismatch));
        }
        if !valid_phone(&self.phone_number) {
            return Err(text(locale, Msg::InvalidPhone));
        }
        Ok(())
    }
}

fn valid_phone(phone: &str) -> bool {
    phone.chars().filter(|c| c.is_ascii_digit()).count() >= 10
}

#[derive(Debug)]
struct Challenge {
    phone: String,
    purpose: OtpPurpose,
    consumed: bool,
}

/// Sequences the remote calls that turn a phone number into an authenticated
/// session. Every operation reports through the notifier and returns a plain
/// bool; no error crosses this boundary.
pub struct OtpCoordinator<A, N, S> {
    api: A,
    notifier: N,
    store: SessionStore<S>,
    locale: Locale,
    pub cooldown: ResendCooldown,
    challenge: Option<Challenge>,
}

impl<A, N, S> OtpCoordinator<A, N, S>
where
    A: DirectoryApi,
    N: Notifier,
    S: KeyValueStorage,
{
    pub fn new(api: A, notifier: N, store: SessionStore<S>, locale: Locale) -> Self {
        Self {
            api,
            notifier,
            store,
            locale,
            cooldown: ResendCooldown::default(),
            challenge: None,
        }
    }

    fn fallback(&self) -> &'static str {
        text(self.locale, Msg::GenericFailure)
    }

    fn report_failure(&self, message: Option<String>, err: Option<ApiError>) {
        if let Some(e) = err {
            tracing::warn!(error = %e, "directory call failed");
        }
        // Thrown errors and `success:false` payloads look the same to the
        // user: one error toast, server message when there is one.
        let message = message.unwrap_or_else(|| self.fallback().to_string());
        self.notifier.error(&message);
    }

    /// Request an OTP dispatch. Blocked while the resend cooldown is
    /// running; a successful send resets it to 60.
    pub async fn send_code(&mut self, phone: &str, purpose: OtpPurpose) -> bool {
        if !self.cooldown.ready() {
            tracing::debug!(remaining = self.cooldown.remaining(), "resend blocked by cooldown");
            return false;
        }
        if !valid_phone(phone) {
            self.notifier.error(text(self.locale, Msg::InvalidPhone));
            return false;
        }

        let req = SendOtpRequest {
            phone_number: phone.to_string(),
            purpose,
        };
        match self.api.send_otp(&req).await {
            Ok(resp) if resp.success => {
                self.cooldown.start();
                self.challenge = Some(Challenge {
                    phone: phone.to_string(),
                    purpose,
                    consumed: false,
                });
                // The development backend echoes the code in place of real
                // SMS delivery; it must reach the user, not be discarded.
                let message = match resp.otp_code {
                    Some(code) => format!(
                        "{} ({})",
                        resp.message.unwrap_or_else(|| text(self.locale, Msg::OtpSent).to_string()),
                        code
                    ),
                    None => resp.message.unwrap_or_else(|| text(self.locale, Msg::OtpSent).to_string()),
                };
                self.notifier.success(&message);
                true
            }
            Ok(resp) => {
                self.report_failure(resp.message, None);
                false
            }
            Err(e) => {
                self.report_failure(None, Some(e));
                false
            }
        }
    }

    /// Submit the collected 6 digits. A successfully verified challenge is
    /// marked consumed locally so stale UI state cannot resubmit it.
    pub async fn verify_code(&mut self, phone: &str, code: &str, purpose: OtpPurpose) -> bool {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            self.notifier.error(text(self.locale, Msg::IncompleteOtp));
            return false;
        }
        if let Some(ch) = &self.challenge {
            if ch.consumed && ch.phone == phone && ch.purpose == purpose {
                self.notifier.error(self.fallback());
                return false;
            }
        }

        let req = VerifyOtpRequest {
            phone_number: phone.to_string(),
            otp_code: code.to_string(),
            purpose,
        };
        match self.api.verify_otp(&req).await {
            Ok(resp) if resp.success => {
                if let Some(ch) = &mut self.challenge {
                    ch.consumed = true;
                }
                true
            }
            Ok(resp) => {
                self.report_failure(resp.message, None);
                false
            }
            Err(e) => {
                self.report_failure(None, Some(e));
                false
            }
        }
    }

    /// Create the account after a successful registration verify. Not
    /// idempotent; a duplicate attempt surfaces the remote error.
    pub async fn create_account(
        &mut self,
        phone: &str,
        password: &str,
        invite_code: Option<&str>,
    ) -> bool {
        let req = CreateUserRequest {
            phone_number: phone.to_string(),
            password: password.to_string(),
            invitation_code: invite_code.map(|c| c.to_string()),
        };
        match self.api.create_user(&req).await {
            Ok(resp) if resp.success => {
                if let Some(message) = resp.message {
                    self.notifier.success(&message);
                }
                true
            }
            Ok(resp) => {
                self.report_failure(resp.message, None);
                false
            }
            Err(e) => {
                self.report_failure(None, Some(e));
                false
            }
        }
    }

    /// Password login: authenticate, then credential sign-in with the
    /// returned email, then populate the local session in one write.
    pub async fn login(&mut self, phone: &str, password: &str) -> bool {
        if phone.is_empty() || password.is_empty() {
            self.notifier.error(text(self.locale, Msg::RequiredFields));
            return false;
        }

        let auth = match self
            .api
            .authenticate(&AuthenticateRequest {
                phone_number: phone.to_string(),
                password: password.to_string(),
            })
            .await
        {
            Ok(resp) if resp.success => resp,
            Ok(resp) => {
                self.report_failure(resp.message, None);
                return false;
            }
            Err(e) => {
                self.report_failure(None, Some(e));
                return false;
            }
        };

        let (Some(email), Some(user_id)) = (auth.email, auth.user_id) else {
            self.notifier.error(self.fallback());
            return false;
        };

        match self
            .api
            .sign_in(&SignInRequest {
                email,
                password: password.to_string(),
            })
            .await
        {
            Ok(resp) if resp.success => {
                let Some(token) = resp.token else {
                    self.notifier.error(self.fallback());
                    return false;
                };
                self.store.save(&SessionRecord::new(
                    resp.phone.unwrap_or_else(|| phone.to_string()),
                    resp.role.unwrap_or_else(|| "user".to_string()),
                    resp.user_id.unwrap_or(user_id),
                    token,
                ));
                if let Some(message) = resp.message {
                    self.notifier.success(&message);
                }
                true
            }
            Ok(resp) => {
                self.report_failure(resp.message, None);
                false
            }
            Err(e) => {
                self.report_failure(None, Some(e));
                false
            }
        }
    }

    /// Explicit sign-out: best-effort remote invalidation, then the local
    /// record goes in one clear.
    pub async fn sign_out(&mut self) {
        if let Some(record) = self.store.load() {
            if !record.token.is_empty() {
                if let Err(e) = self.api.sign_out(&record.token).await {
                    tracing::warn!(error = %e, "remote sign-out failed");
                }
            }
        }
        self.store.clear();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::client::api::{ApiError, DirectoryApi};
    use crate::models::{
        AckResponse, AuthenticateResponse, SendOtpResponse, SessionInfo, SignInResponse,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockDirectory {
        pub send_responses: Mutex<Vec<Result<SendOtpResponse, ApiError>>>,
        pub verify_responses: Mutex<Vec<Result<AckResponse, ApiError>>>,
        pub create_responses: Mutex<Vec<Result<AckResponse, ApiError>>>,
        pub auth_responses: Mutex<Vec<Result<AuthenticateResponse, ApiError>>>,
        pub sign_in_responses: Mutex<Vec<Result<SignInResponse, ApiError>>>,
        pub session_responses: Mutex<Vec<Result<SessionInfo, ApiError>>>,
        pub calls: Mutex<Vec<String>>,
    }

    fn next<T>(queue: &Mutex<Vec<Result<T, ApiError>>>) -> Result<T, ApiError> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            Err(ApiError::Status(reqwest::StatusCode::NOT_IMPLEMENTED))
        } else {
            queue.remove(0)
        }
    }

    #[async_trait]
    impl DirectoryApi for MockDirectory {
        async fn send_otp(&self, req: &SendOtpRequest) -> Result<SendOtpResponse, ApiError> {
            self.calls.lock().unwrap().push(format!("send:{}", req.phone_number));
            next(&self.send_responses)
        }

        async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<AckResponse, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("verify:{}", req.otp_code));
            next(&self.verify_responses)
        }

        async fn create_user(&self, req: &CreateUserRequest) -> Result<AckResponse, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create:{}", req.phone_number));
            next(&self.create_responses)
        }

        async fn authenticate(
            &self,
            req: &AuthenticateRequest,
        ) -> Result<AuthenticateResponse, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("auth:{}", req.phone_number));
            next(&self.auth_responses)
        }

        async fn sign_in(&self, req: &SignInRequest) -> Result<SignInResponse, ApiError> {
            self.calls.lock().unwrap().push(format!("signin:{}", req.email));
            next(&self.sign_in_responses)
        }

        async fn fetch_session(&self, token: &str) -> Result<SessionInfo, ApiError> {
            self.calls.lock().unwrap().push(format!("session:{token}"));
            next(&self.session_responses)
        }

        async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(format!("signout:{token}"));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub messages: Mutex<Vec<(bool, String)>>,
    }

    impl Notifier for &RecordingNotifier {
        fn success(&self, message: &str) {
            self.messages.lock().unwrap().push((true, message.to_string()));
        }

        fn error(&self, message: &str) {
            self.messages.lock().unwrap().push((false, message.to_string()));
        }
    }
}
