use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub balance: f64,
    pub invitation_code: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub nickname: Option<String>,
    pub contact_email: Option<String>,
    pub wechat: Option<String>,
    pub created_at: String,
}
