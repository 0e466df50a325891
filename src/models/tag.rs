//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity; both the name and the slug are globally unique.
///
/// Tags are created implicitly when a post references an unknown name,
/// or explicitly through the tag endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name (unique, stored normalized)
    pub name: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Optional description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag with the given parameters.
    pub fn new(name: String, slug: String, description: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a tag explicitly
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagInput {
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new() {
        let tag = Tag::new("rust".to_string(), "rust".to_string(), None);

        assert_eq!(tag.id, 0);
        assert_eq!(tag.name, "rust");
        assert_eq!(tag.slug, "rust");
        assert!(tag.description.is_none());
    }
}
