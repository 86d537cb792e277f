//! iTunes Search API request parameters.

use serde::Serialize;

use crate::providers::ProviderError;

/// Query string for `GET /search`.
///
/// See https://performance-partners.apple.com/search-api
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text search term.
    pub term: String,
    /// Result type; `song` returns individual tracks.
    pub entity: &'static str,
    /// Number of results (1-200).
    pub limit: u8,
    pub media: &'static str,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into(), entity: "song", limit: 5, media: "music" }
    }

    /// Validate the search request parameters.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.term.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("search term cannot be empty".to_string()));
        }
        if self.term.len() > 500 {
            return Err(ProviderError::InvalidQuery(format!(
                "search term too long: {} chars (max 500)",
                self.term.len()
            )));
        }
        if !(1..=200).contains(&self.limit) {
            return Err(ProviderError::InvalidQuery("limit must be 1-200".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = SearchRequest::new("Pink Floyd Money");
        assert_eq!(req.entity, "song");
        assert_eq!(req.limit, 5);
        assert_eq!(req.media, "music");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_serializes_as_query_params() {
        let req = SearchRequest::new("money");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"term": "money", "entity": "song", "limit": 5, "media": "music"}));
    }

    #[test]
    fn test_validate_empty() {
        let req = SearchRequest::new("   ");
        assert!(matches!(req.validate(), Err(ProviderError::InvalidQuery(_))));
    }

    #[test]
    fn test_validate_limit() {
        let req = SearchRequest { limit: 0, ..SearchRequest::new("money") };
        assert!(req.validate().is_err());
    }
}
