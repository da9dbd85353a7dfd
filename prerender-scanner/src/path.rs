//! Output path derivation and save-strategy classification.

use std::path::{Path, PathBuf};

/// How a fetched body is treated when it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Scanned for references, origin-stripped, suffixed with `.html`/`index.html`.
    Html,
    /// Scanned for `url()` references and origin-stripped.
    Css,
    /// Origin-stripped, path kept as-is.
    Text,
    /// Copied byte-for-byte with exclusive-create semantics.
    Binary,
}

const TEXTUAL_APPLICATION_TYPES: &[&str] = &[
    "application/json",
    "application/javascript",
    "application/ecmascript",
    "application/x-javascript",
    "application/xml",
    "application/manifest+json",
    "application/ld+json",
    "application/rss+xml",
    "application/atom+xml",
];

impl ContentClass {
    /// Classify a `content-type` header value. Parameters such as
    /// `charset` are ignored. A missing header is treated as plain text.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return ContentClass::Text;
        };

        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "" => ContentClass::Text,
            "text/html" | "application/xhtml+xml" => ContentClass::Html,
            "text/css" => ContentClass::Css,
            _ if essence.starts_with("image/")
                || essence.starts_with("audio/")
                || essence.starts_with("video/")
                || essence.starts_with("font/") =>
            {
                ContentClass::Binary
            }
            _ if essence.starts_with("text/") => ContentClass::Text,
            _ if TEXTUAL_APPLICATION_TYPES.contains(&essence.as_str())
                || essence.ends_with("+json")
                || essence.ends_with("+xml") =>
            {
                ContentClass::Text
            }
            _ => ContentClass::Binary,
        }
    }

    /// Whether references should be extracted from bodies of this class.
    pub fn is_scannable(self) -> bool {
        matches!(self, ContentClass::Html | ContentClass::Css)
    }
}

/// Where and how a resource is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// Write to this path, relative to the output root, starting with `/`.
    Write { relative: String, class: ContentClass },
    /// The path still names a directory and the resource is not HTML.
    Ambiguous { relative: String },
}

impl OutputPlan {
    /// Resolve the relative path under `root`. Returns `None` for ambiguous plans.
    pub fn resolve(&self, root: &Path) -> Option<PathBuf> {
        match self {
            OutputPlan::Write { relative, .. } => Some(join_under(root, relative)),
            OutputPlan::Ambiguous { .. } => None,
        }
    }
}

/// Map a URL path to its output location for the given class.
///
/// ```
/// use prerender_scanner::path::{map_output_path, ContentClass, OutputPlan};
///
/// let plan = map_output_path("/about/", ContentClass::Html);
/// assert_eq!(
///     plan,
///     OutputPlan::Write { relative: "/about/index.html".into(), class: ContentClass::Html }
/// );
/// ```
pub fn map_output_path(url_path: &str, class: ContentClass) -> OutputPlan {
    let mut relative = if url_path.starts_with('/') {
        url_path.to_string()
    } else {
        format!("/{}", url_path)
    };

    if class == ContentClass::Html {
        if !relative.ends_with('/') && !relative.ends_with(".html") {
            relative.push_str(".html");
        }
        if relative.ends_with('/') {
            relative.push_str("index.html");
        }
    }

    if relative.ends_with('/') {
        return OutputPlan::Ambiguous { relative };
    }

    OutputPlan::Write { relative, class }
}

fn join_under(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}
