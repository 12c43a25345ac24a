// src/discovery/description.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::GenerativeService;
use crate::types::gemini::GenerateContentRequest;

pub const NO_KEY_DESCRIPTION: &str =
    "Harika bir çalışma ortamı sunuyoruz. Detaylar için iletişime geçin.";
pub const FALLBACK_DESCRIPTION: &str = "Detaylar için iletişime geçin.";
pub const MISSING_FIELDS_MESSAGE: &str = "Lütfen önce iş başlığı ve şirket adını giriniz.";

/// Title and company must both be filled before asking for a description
pub fn ensure_title_and_company(title: &str, company: &str) -> Result<()> {
    if title.trim().is_empty() || company.trim().is_empty() {
        anyhow::bail!(MISSING_FIELDS_MESSAGE);
    }
    Ok(())
}

pub struct DescriptionWriter {
    service: Arc<dyn GenerativeService>,
}

impl DescriptionWriter {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// Always returns text; failures fall back to a fixed sentence
    pub async fn generate(&self, title: &str, company: &str) -> String {
        if !self.service.has_credential() {
            warn!("API key missing, using default description");
            return NO_KEY_DESCRIPTION.to_string();
        }

        let prompt = format!(
            "Write a short, professional, and inviting job description (in Turkish) for a \"{}\" position at \"{}\". Max 50 words.",
            title, company
        );

        match self
            .service
            .generate_content(&GenerateContentRequest::text(prompt))
            .await
        {
            Ok(response) => match response.text() {
                Some(text) => {
                    info!("Generated description for {} at {}", title, company);
                    text.trim().to_string()
                }
                None => FALLBACK_DESCRIPTION.to_string(),
            },
            Err(e) => {
                error!("Error generating description: {:#}", e);
                FALLBACK_DESCRIPTION.to_string()
            }
        }
    }
}
