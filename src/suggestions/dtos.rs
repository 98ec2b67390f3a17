use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::extractor::{Suggestion, pipeline::DESCRIPTION_REQUIRED};

pub const MAX_DESCRIPTION_CHARS: usize = 4096;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestRequest {
    /// Free text ("I read Dune by Frank Herbert") or a URL.
    #[serde(default)]
    #[schema(value_type = String)]
    pub description: Option<Value>,
}

impl SuggestRequest {
    /// The description as a string, or the message to return with a 400.
    pub fn validate(&self) -> Result<&str, String> {
        let description = match &self.description {
            Some(Value::String(s)) if !s.trim().is_empty() => s.as_str(),
            _ => return Err(DESCRIPTION_REQUIRED.to_string()),
        };
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err("Description too long".to_string());
        }
        Ok(description)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestResponse {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(description: Value) -> SuggestRequest {
        serde_json::from_value(json!({ "description": description })).unwrap()
    }

    #[test]
    fn test_suggest_request_valid() {
        let req = request(json!("https://example.com"));
        assert_eq!(req.validate().unwrap(), "https://example.com");
    }

    #[test]
    fn test_suggest_request_missing() {
        let req: SuggestRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.validate().unwrap_err(), DESCRIPTION_REQUIRED);
    }

    #[test]
    fn test_suggest_request_not_a_string() {
        assert!(request(json!(42)).validate().is_err());
        assert!(request(json!(["a"])).validate().is_err());
        assert!(request(Value::Null).validate().is_err());
    }

    #[test]
    fn test_suggest_request_blank() {
        assert!(request(json!("   ")).validate().is_err());
    }

    #[test]
    fn test_suggest_request_too_long() {
        let req = request(json!("a".repeat(MAX_DESCRIPTION_CHARS + 1)));
        assert_eq!(req.validate().unwrap_err(), "Description too long");
    }
}
