//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity; belongs to exactly one post and one author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    /// Comments are approved by default; listing filters on this flag
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment for the given post and author.
    pub fn new(post_id: i64, author_id: i64, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            post_id,
            author_id,
            content,
            is_approved: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_new_defaults_to_approved() {
        let comment = Comment::new(1, 2, "Nice post".to_string());

        assert_eq!(comment.post_id, 1);
        assert_eq!(comment.author_id, 2);
        assert!(comment.is_approved);
    }
}
