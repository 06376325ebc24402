pub mod user;
pub mod otp;
pub mod session;

pub use user::{User, Profile};
pub use otp::{
    OtpPurpose,
    SendOtpRequest,
    SendOtpResponse,
    VerifyOtpRequest,
    CreateUserRequest,
    AckResponse,
};
pub use session::{
    AuthenticateRequest,
    AuthenticateResponse,
    SignInRequest,
    SignInResponse,
    SessionInfo,
};
