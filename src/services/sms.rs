use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Serialize)]
struct SendSmsRequest {
    phone: String,
    content: String,
}

#[derive(Deserialize)]
struct SmsGatewayResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Thin client for the SMS gateway that delivers OTP codes in production.
/// Development deployments skip it and echo the code in the API response.
#[derive(Clone)]
pub struct SmsGateway {
    client: Client,
    gateway_url: String,
}

impl SmsGateway {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let gateway_url = env::var("SMS_GATEWAY_URL")?;
        Ok(SmsGateway {
            client: Client::new(),
            gateway_url,
        })
    }

    pub async fn send_otp(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let request = SendSmsRequest {
            phone: phone.to_string(),
            content: format!("Your verification code is {code}. Valid for 5 minutes."),
        };

        let response_text = self
            .client
            .post(&self.gateway_url)
            .json(&request)
            .send()
            .await?
            .text()
            .await?;

        let response: SmsGatewayResponse = serde_json::from_str(&response_text)
            .map_err(|e| format!("Failed to parse SMS gateway response: {}", e))?;

        if response.ok {
            Ok(())
        } else {
            Err(format!("SMS gateway error: {:?}", response.description).into())
        }
    }
}
