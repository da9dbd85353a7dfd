//! Removal of the mirrored origin from saved text.

use url::{Origin, Url};

/// Strips the target origin from saved text so references become
/// origin-relative. Both the plain form (`https://host`) and the
/// JSON-escaped form (`https:\/\/host`) are removed.
#[derive(Debug, Clone)]
pub struct OriginRewriter {
    plain: String,
    escaped: String,
}

impl OriginRewriter {
    pub fn new(target: &Url) -> Self {
        Self::from_origin(&target.origin())
    }

    pub fn from_origin(origin: &Origin) -> Self {
        let plain = origin.ascii_serialization();
        let escaped = plain.replace('/', "\\/");
        Self { plain, escaped }
    }

    pub fn rewrite(&self, text: &str) -> String {
        // Opaque origins serialize to "null"; that literal is never stripped.
        if self.plain == "null" {
            return text.to_string();
        }

        let mut out = text.to_string();
        // Removing one literal can splice two halves into a new one.
        while out.contains(&self.plain) || out.contains(&self.escaped) {
            out = out.replace(&self.plain, "").replace(&self.escaped, "");
        }
        out
    }
}
