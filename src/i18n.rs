use actix_web::HttpRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    En,
    Zh,
}

pub fn detect_locale(req: &HttpRequest) -> Locale {
    if let Some(lang) = req.query_string().split('&').find_map(|kv| {
        let mut it = kv.splitn(2, '=');
        let k = it.next()?;
        let v = it.next()?;
        if k == "lang" { Some(v) } else { None }
    }) {
        return match lang.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh-hans" => Locale::Zh,
            _ => Locale::En,
        };
    }

    if let Some(h) = req.headers().get("Accept-Language").and_then(|v| v.to_str().ok()) {
        let hl = h.to_ascii_lowercase();
        if hl.starts_with("zh") { return Locale::Zh; }
    }

    Locale::En
}

#[derive(Clone, Copy, Debug)]
pub enum Msg {
    OtpSent,
    OtpSendFailed,
    InvalidOtp,
    OtpExpired,
    TooManyAttempts,
    OtpVerified,
    VerificationRequired,
    AccountExists,
    AccountCreated,
    AccountCreateFailed,
    InvalidCredentials,
    SignedIn,
    SignedOut,
    InvalidPhone,
    RequiredFields,
    PasswordMismatch,
    IncompleteOtp,
    GenericFailure,
}

pub fn text(locale: Locale, msg: Msg) -> &'static str {
    match (locale, msg) {
        (Locale::En, Msg::OtpSent) => "OTP code sent",
        (Locale::Zh, Msg::OtpSent) => "验证码已发送",
        (Locale::En, Msg::OtpSendFailed) => "Failed to send OTP code",
        (Locale::Zh, Msg::OtpSendFailed) => "验证码发送失败",
        (Locale::En, Msg::InvalidOtp) => "Invalid OTP code",
        (Locale::Zh, Msg::InvalidOtp) => "验证码无效",
        (Locale::En, Msg::OtpExpired) => "OTP code expired",
        (Locale::Zh, Msg::OtpExpired) => "验证码已过期",
        (Locale::En, Msg::TooManyAttempts) => "Too many attempts, request a new code",
        (Locale::Zh, Msg::TooManyAttempts) => "尝试次数过多，请重新获取验证码",
        (Locale::En, Msg::OtpVerified) => "OTP verified",
        (Locale::Zh, Msg::OtpVerified) => "验证成功",
        (Locale::En, Msg::VerificationRequired) => "Phone verification required",
        (Locale::Zh, Msg::VerificationRequired) => "请先完成手机验证",
        (Locale::En, Msg::AccountExists) => "Account already exists",
        (Locale::Zh, Msg::AccountExists) => "账号已存在",
        (Locale::En, Msg::AccountCreated) => "Account created successfully",
        (Locale::Zh, Msg::AccountCreated) => "注册成功",
        (Locale::En, Msg::AccountCreateFailed) => "Failed to create account",
        (Locale::Zh, Msg::AccountCreateFailed) => "注册失败",
        (Locale::En, Msg::InvalidCredentials) => "Invalid phone number or password",
        (Locale::Zh, Msg::InvalidCredentials) => "手机号或密码错误",
        (Locale::En, Msg::SignedIn) => "Login successful",
        (Locale::Zh, Msg::SignedIn) => "登录成功",
        (Locale::En, Msg::SignedOut) => "Signed out",
        (Locale::Zh, Msg::SignedOut) => "已退出登录",
        (Locale::En, Msg::InvalidPhone) => "Please enter a valid phone number",
        (Locale::Zh, Msg::InvalidPhone) => "请输入有效的手机号",
        (Locale::En, Msg::RequiredFields) => "Phone number and password are required",
        (Locale::Zh, Msg::RequiredFields) => "请输入手机号和密码",
        (Locale::En, Msg::PasswordMismatch) => "Passwords do not match",
        (Locale::Zh, Msg::PasswordMismatch) => "两次输入的密码不一致",
        (Locale::En, Msg::IncompleteOtp) => "Enter the 6-digit code",
        (Locale::Zh, Msg::IncompleteOtp) => "请输入6位验证码",
        (Locale::En, Msg::GenericFailure) => "Something went wrong, please try again",
        (Locale::Zh, Msg::GenericFailure) => "操作失败，请重试",
    }
}
