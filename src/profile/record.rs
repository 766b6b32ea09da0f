use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PAGE_TITLE_KEY: &str = "pageTitle";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Founder,
    Cofounder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Founder => f.write_str("founder"),
            Role::Cofounder => f.write_str("cofounder"),
        }
    }
}

/// Structured fields extracted from one rendered profile page.
///
/// Optional fields that were not found on the page are left out of the
/// serialized object entirely, so consumers can tell "missing" apart from
/// "present but empty". The map-valued fields are keyed by page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub team: BTreeMap<Role, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub recognitions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ProfileRecord {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            company_name: None,
            city: None,
            registration_id: None,
            bio: None,
            team: BTreeMap::new(),
            attributes: BTreeMap::new(),
            recognitions: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn page_title(&self) -> Option<&str> {
        self.metadata.get(PAGE_TITLE_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = ProfileRecord::new("https://example.com/profile/1");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "sourceUrl": "https://example.com/profile/1",
                "team": {},
                "attributes": {},
                "recognitions": {},
                "metadata": {},
            })
        );
    }

    #[test]
    fn test_field_names() {
        let mut record = ProfileRecord::new("https://example.com/profile/2");
        record.company_name = Some("Acme".to_string());
        record.registration_id = Some("DIPP1234".to_string());
        record.bio = Some(String::new());
        record.team.insert(Role::Cofounder, "Ravi".to_string());
        record
            .recognitions
            .insert("awards".to_string(), vec!["Best Pitch".to_string()]);
        record
            .metadata
            .insert(PAGE_TITLE_KEY.to_string(), "Acme | Showcase".to_string());

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["companyName"], "Acme");
        assert_eq!(value["registrationId"], "DIPP1234");
        assert_eq!(value["bio"], "");
        assert!(value.get("city").is_none());
        assert_eq!(value["team"]["cofounder"], "Ravi");
        assert_eq!(value["recognitions"]["awards"], json!(["Best Pitch"]));
        assert_eq!(value["metadata"]["pageTitle"], "Acme | Showcase");
        assert_eq!(record.page_title(), Some("Acme | Showcase"));
    }

    #[test]
    fn test_deserializes_what_it_serializes() {
        let mut record = ProfileRecord::new("https://example.com/profile/3");
        record.city = Some("Pune".to_string());
        record.team.insert(Role::Founder, "Asha".to_string());

        let text = serde_json::to_string(&record).unwrap();
        let back: ProfileRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
