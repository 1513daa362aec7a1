use serde::{Deserialize, Serialize};

/// Static preview card for a short link; nothing is fetched from the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreview {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

impl LinkPreview {
    pub fn for_url(original_url: &str) -> Self {
        Self {
            title: "Link Preview".to_string(),
            description: format!("Preview for {original_url}"),
            image: String::new(),
            url: original_url.to_string(),
        }
    }
}

/// Where a QR code for a short link can be rendered; no image is produced here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrDescriptor {
    pub short_code: String,
    pub short_url: String,
    pub qr_code_url: String,
    pub original_url: String,
}

pub const QR_RENDER_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=";

impl QrDescriptor {
    pub fn new(short_code: &str, short_url: String, original_url: &str) -> Self {
        let encoded: String = url::form_urlencoded::byte_serialize(short_url.as_bytes()).collect();
        Self {
            short_code: short_code.to_string(),
            qr_code_url: format!("{QR_RENDER_ENDPOINT}{encoded}"),
            short_url,
            original_url: original_url.to_string(),
        }
    }
}
