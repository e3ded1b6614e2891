use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "Fields Manager";
pub const DEFAULT_ABOUT: &str = "Welcome to Fields Manager - your sports field booking platform";
pub const DEFAULT_TERMS: &str = "Terms and conditions will be updated soon.";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: i32,
    pub admin_id: i32,
    pub name: String,
    pub logo_url: Option<String>,
    pub about_image_url: Option<String>,
    pub about_description: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub facebook_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub phone_number: Option<String>,
    pub second_phone_number: Option<String>,
}

impl Settings {
    /// Record created when none exist yet; `id` is assigned by the store.
    pub fn defaults(admin_id: i32) -> Self {
        Self {
            id: 0,
            admin_id,
            name: DEFAULT_NAME.to_string(),
            logo_url: None,
            about_image_url: None,
            about_description: Some(DEFAULT_ABOUT.to_string()),
            terms_and_conditions: Some(DEFAULT_TERMS.to_string()),
            facebook_url: None,
            whatsapp_number: None,
            phone_number: None,
            second_phone_number: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub about_image_url: Option<String>,
    pub about_description: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub facebook_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub phone_number: Option<String>,
    pub second_phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRequest {
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicSettings {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutSettings {
    pub about_image_url: Option<String>,
    pub about_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsSettings {
    pub terms_and_conditions: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSettings {
    pub facebook_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub phone_number: Option<String>,
    pub second_phone_number: Option<String>,
}
