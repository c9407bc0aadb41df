//! Wire types for the transcription/summarization backend.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
    #[default]
    Structured,
    BulletPoints,
    Paragraph,
    ActionItems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Brief,
    #[default]
    Medium,
    Detailed,
}

/// Per-user summary preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub default_format: SummaryFormat,
    pub default_language: String,
    pub default_detail_level: DetailLevel,
    pub auto_generate_summary: bool,
    pub include_timestamps: bool,
    pub include_action_items: bool,
    pub include_decisions: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_format: SummaryFormat::Structured,
            default_language: "en".to_string(),
            default_detail_level: DetailLevel::Medium,
            auto_generate_summary: true,
            include_timestamps: true,
            include_action_items: true,
            include_decisions: true,
        }
    }
}

/// An audio file on its way to `/transcribe`.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub meeting_id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub transcript_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub meeting_id: String,
    pub format: SummaryFormat,
    pub language: String,
    pub detail_level: DetailLevel,
    pub include_timestamps: bool,
}

impl SummarizeRequest {
    pub fn from_preferences(meeting_id: &str, prefs: &Preferences) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            format: prefs.default_format,
            language: prefs.default_language.clone(),
            detail_level: prefs.default_detail_level,
            include_timestamps: prefs.include_timestamps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub summary_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub meeting_id: String,
    pub summary_text: String,
    #[serde(default)]
    pub generation_time_seconds: Option<f64>,
}

/// `GET /summaries` body. Summary rows are passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryList {
    #[serde(default)]
    pub summaries: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineRequest {
    pub summary_id: String,
    pub user_message: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineResponse {
    pub assistant_message: String,
    #[serde(default)]
    pub is_summary_updated: bool,
    #[serde(default)]
    pub updated_summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

// Row ids come back as integers or uuids depending on the table.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}
