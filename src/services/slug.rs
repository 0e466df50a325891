//! Slug generation
//!
//! Derives URL-safe identifiers from free text. Uniqueness is enforced by
//! the entity services, which probe the repository for collisions and
//! append numeric suffixes.

/// Maximum slug length before truncation
const MAX_SLUG_LEN: usize = 100;

/// Fallback used when the input yields no slug characters at all
const FALLBACK_SLUG: &str = "post";

/// Generate a URL-friendly slug from free text.
///
/// Lowercases the input, strips everything except ASCII alphanumerics,
/// spaces and hyphens, collapses whitespace/hyphen runs to a single
/// hyphen and trims hyphens from both ends. Results longer than the cap
/// are cut at a hyphen boundary when one exists, never mid-word.
pub fn generate_slug(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else if c == ' ' || c == '-' {
            pending_hyphen = true;
        }
        // all other characters are stripped
    }

    if slug.len() > MAX_SLUG_LEN {
        let cut = slug[..MAX_SLUG_LEN]
            .rfind('-')
            .unwrap_or(MAX_SLUG_LEN);
        slug.truncate(cut);
        // A trailing run of hyphens can survive the cut
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        return FALLBACK_SLUG.to_string();
    }

    slug
}

/// Build the nth collision candidate for a base slug.
///
/// The zeroth candidate is the base itself; subsequent candidates append
/// `-1`, `-2`, and so on.
pub fn slug_candidate(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, counter)
    }
}
