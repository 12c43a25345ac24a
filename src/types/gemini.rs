// src/types/gemini.rs
//! Wire types for the Gemini `generateContent` endpoint

use serde::{Deserialize, Serialize};

use crate::utils::non_blank;

// ===== Request Types =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl GenerateContentRequest {
    /// Plain text-generation request
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            tools: Vec::new(),
            tool_config: None,
        }
    }

    /// Maps-grounded request biased toward the given point
    pub fn maps_grounded(prompt: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            tools: vec![Tool::google_maps()],
            tool_config: Some(ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude,
                        longitude,
                    },
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps: Option<serde_json::Value>,
}

impl Tool {
    pub fn google_maps() -> Self {
        Self {
            google_maps: Some(serde_json::json!({})),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

// ===== Response Types =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

/// Reference carried by a maps or web grounding chunk
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl SourceRef {
    /// `(uri, title)` when both are present and non-blank
    pub fn uri_and_title(&self) -> Option<(&str, &str)> {
        let uri = non_blank(self.uri.as_deref())?;
        let title = non_blank(self.title.as_deref())?;
        Some((uri, title))
    }
}

/// A grounding chunk, discriminated by the variant key the service set
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGroundingChunk")]
pub enum GroundingChunk {
    Maps(SourceRef),
    Web(SourceRef),
    /// Keys present on a chunk with neither a `maps` nor a `web` entry
    Unrecognized(Vec<String>),
}

impl GroundingChunk {
    pub fn source(&self) -> Option<&SourceRef> {
        match self {
            GroundingChunk::Maps(source) | GroundingChunk::Web(source) => Some(source),
            GroundingChunk::Unrecognized(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GroundingChunk::Maps(_) => "maps",
            GroundingChunk::Web(_) => "web",
            GroundingChunk::Unrecognized(_) => "unrecognized",
        }
    }
}

#[derive(Deserialize)]
struct RawGroundingChunk {
    #[serde(default)]
    maps: Option<SourceRef>,
    #[serde(default)]
    web: Option<SourceRef>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

impl From<RawGroundingChunk> for GroundingChunk {
    fn from(raw: RawGroundingChunk) -> Self {
        // maps wins when the service sets both
        match (raw.maps, raw.web) {
            (Some(maps), _) => GroundingChunk::Maps(maps),
            (None, Some(web)) => GroundingChunk::Web(web),
            (None, None) => GroundingChunk::Unrecognized(raw.other.keys().cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_request_shape() {
        let request = GenerateContentRequest::maps_grounded("find cafes", 41.0, 29.0);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "find cafes");
        assert!(value["tools"][0]["googleMaps"].is_object());
        assert_eq!(
            value["toolConfig"]["retrievalConfig"]["latLng"]["latitude"],
            41.0
        );
    }

    #[test]
    fn test_text_request_has_no_tools() {
        let value = serde_json::to_value(GenerateContentRequest::text("hello")).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("toolConfig").is_none());
    }

    #[test]
    fn test_chunk_variants() {
        let chunks: Vec<GroundingChunk> = serde_json::from_value(serde_json::json!([
            { "maps": { "uri": "https://maps/1", "title": "Kafe", "placeId": "p1" } },
            { "web": { "uri": "https://web/2", "title": "Site" } },
            { "retrievedContext": { "uri": "gs://x" } },
            { "maps": { "uri": "https://maps/3" }, "web": { "uri": "https://web/3", "title": "Web" } }
        ]))
        .unwrap();

        assert_eq!(chunks[0].kind(), "maps");
        assert_eq!(
            chunks[0].source().and_then(SourceRef::uri_and_title),
            Some(("https://maps/1", "Kafe"))
        );
        assert_eq!(chunks[1].kind(), "web");
        assert_eq!(
            chunks[2],
            GroundingChunk::Unrecognized(vec!["retrievedContext".to_string()])
        );
        // maps present without a title: not rescued by the web entry
        assert_eq!(chunks[3].kind(), "maps");
        assert_eq!(chunks[3].source().and_then(SourceRef::uri_and_title), None);
    }

    #[test]
    fn test_response_text() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Merhaba " }, { "text": "dünya" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Merhaba dünya"));

        assert_eq!(GenerateContentResponse::default().text(), None);
    }
}
