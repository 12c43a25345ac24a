use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    Seeker,
    Employer,
}

impl UserRole {
    pub fn toggled(self) -> Self {
        match self {
            UserRole::Seeker => UserRole::Employer,
            UserRole::Employer => UserRole::Seeker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl LocationData {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A listing, authored by an employer or synthesized from discovered places
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub salary: String,
    pub location: LocationData,
    pub employer_id: String,
    pub employer_name: String,
    pub posted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_uri: Option<String>,
}

impl Job {
    pub fn is_ai_generated(&self) -> bool {
        self.is_ai_generated.unwrap_or(false)
    }
}

/// Employer form payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub salary: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl JobDraft {
    /// Names of required fields left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.company_name.trim().is_empty() {
            missing.push("companyName");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.salary.trim().is_empty() {
            missing.push("salary");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_toggle() {
        assert_eq!(UserRole::Seeker.toggled(), UserRole::Employer);
        assert_eq!(UserRole::Employer.toggled(), UserRole::Seeker);
        assert_eq!(UserRole::default(), UserRole::Seeker);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::Employer).unwrap(),
            "\"EMPLOYER\""
        );
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = Job {
            id: "1".to_string(),
            title: "Barista".to_string(),
            company_name: "Keyif Kahvesi".to_string(),
            description: "desc".to_string(),
            salary: "22.000 TL".to_string(),
            location: LocationData::new(41.0, 29.0),
            employer_id: "emp1".to_string(),
            employer_name: "Ahmet Y.".to_string(),
            posted_at: Utc::now(),
            is_ai_generated: Some(true),
            maps_uri: Some("https://maps.google.com/?cid=1".to_string()),
        };

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["companyName"], "Keyif Kahvesi");
        assert_eq!(value["isAiGenerated"], true);
        assert_eq!(value["mapsUri"], "https://maps.google.com/?cid=1");
        assert!(value["location"].get("address").is_none());
    }

    #[test]
    fn test_draft_missing_fields() {
        let draft = JobDraft {
            title: "Garson".to_string(),
            company_name: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            draft.missing_fields(),
            vec!["companyName", "description", "salary"]
        );
    }
}
