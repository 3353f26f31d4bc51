//! Shared API request/response types
//!
//! Field names follow the document layout the frontend already depends
//! on: the study-buddy payloads are camelCase, the voice-note payloads
//! snake_case.

use serde::{Deserialize, Serialize};

/// Study preferences sub-document stored on each user profile.
///
/// Every field has a display default so profiles created by the signup
/// flow (which writes none of them) still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyPreferences {
    pub subject: String,
    pub level: String,
    pub availability: String,
    pub study_style: String,
}

impl Default for StudyPreferences {
    fn default() -> Self {
        Self {
            subject: "General".to_string(),
            level: "Intermediate".to_string(),
            availability: "Weekdays".to_string(),
            study_style: "Collaborative".to_string(),
        }
    }
}

/// A candidate study buddy as shown on the discovery screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuddyInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub level: String,
    pub availability: String,
    pub study_style: String,
    pub online: bool,
    /// Simulated match score, recomputed per request.
    pub match_score: i64,
}

/// An incoming buddy request enriched with the sender's profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: String,
    pub from_user_id: String,
    pub from_user_name: String,
    pub from_user_email: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub subject: String,
}

/// An established connection enriched with the buddy's profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBuddy {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_since: Option<String>,
}

/// A transcribed voice note. Held only in process memory; the list is
/// empty again after every restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceNote {
    /// `note_{epoch_millis}`
    pub id: String,
    pub title: String,
    pub transcript: String,
    pub summary: String,
    pub key_points: Vec<String>,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Local part of an email address, used as a display-name fallback for
/// profiles without a `name` field.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_defaults() {
        let prefs = StudyPreferences::default();
        assert_eq!(prefs.subject, "General");
        assert_eq!(prefs.level, "Intermediate");
        assert_eq!(prefs.availability, "Weekdays");
        assert_eq!(prefs.study_style, "Collaborative");
    }

    #[test]
    fn preferences_deserialize_fills_missing_fields() {
        let prefs: StudyPreferences =
            serde_json::from_str(r#"{"subject":"Physics"}"#).expect("should parse");
        assert_eq!(prefs.subject, "Physics");
        assert_eq!(prefs.level, "Intermediate");
    }

    #[test]
    fn preferences_serialize_camel_case() {
        let json = serde_json::to_value(StudyPreferences::default()).expect("should serialize");
        assert!(json.get("studyStyle").is_some());
        assert!(json.get("study_style").is_none());
    }

    #[test]
    fn email_local_part_handles_odd_input() {
        assert_eq!(email_local_part("alice@example.com"), "alice");
        assert_eq!(email_local_part("no-at-sign"), "no-at-sign");
        assert_eq!(email_local_part(""), "");
    }
}
