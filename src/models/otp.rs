use serde::{Deserialize, Serialize};

/// Which workflow a code belongs to. A registration code cannot complete a
/// login and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Registration,
    Login,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Registration => "registration",
            OtpPurpose::Login => "login",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub phone_number: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Echoed in development mode only, in place of real SMS delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp_code: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub phone_number: String,
    pub password: String,
    pub invitation_code: Option<String>,
}

/// Shared `{success, message?}` body for verify-otp and create-user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
