use std::fmt;

use percent_encoding::percent_decode_str;

/// Kind of resolution behind a [`StandardReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    DirectLink,
    DecodedRedirectParam,
    InlineText,
    Unresolved,
}

impl Resolution {
    pub fn label(self) -> &'static str {
        match self {
            Resolution::DirectLink => "direct-link",
            Resolution::DecodedRedirectParam => "decoded-redirect-param",
            Resolution::InlineText => "inline-text",
            Resolution::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedCause {
    /// The detail view has no standard row at all.
    Absent,
    /// The row exists but offers neither a control nor a value.
    NoControl,
    /// Resolution was attempted and failed.
    Failed(String),
}

impl UnresolvedCause {
    fn label(&self) -> &'static str {
        match self {
            UnresolvedCause::Absent => "absent",
            UnresolvedCause::NoControl => "no-control",
            UnresolvedCause::Failed(_) => "failed",
        }
    }
}

/// Best-effort pointer to (or text of) a product's executed standard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardReference {
    DirectLink { url: String },
    DecodedRedirectParam { target: String, url: String },
    InlineText { text: String, link: Option<String> },
    Unresolved { cause: UnresolvedCause },
}

impl StandardReference {
    pub fn unresolved(cause: UnresolvedCause) -> Self {
        StandardReference::Unresolved { cause }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        StandardReference::Unresolved {
            cause: UnresolvedCause::Failed(message.into()),
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            StandardReference::DirectLink { .. } => Resolution::DirectLink,
            StandardReference::DecodedRedirectParam { .. } => Resolution::DecodedRedirectParam,
            StandardReference::InlineText { .. } => Resolution::InlineText,
            StandardReference::Unresolved { .. } => Resolution::Unresolved,
        }
    }

    /// The persisted value; empty when unresolved.
    pub fn value(&self) -> &str {
        match self {
            StandardReference::DirectLink { url } => url,
            StandardReference::DecodedRedirectParam { target, .. } => target,
            StandardReference::InlineText { text, .. } => text,
            StandardReference::Unresolved { .. } => "",
        }
    }

    /// `unresolved:<cause>` for failures, the plain resolution label otherwise.
    pub fn resolution_label(&self) -> String {
        match self {
            StandardReference::Unresolved { cause } => {
                format!("{}:{}", Resolution::Unresolved.label(), cause.label())
            }
            other => other.resolution().label().to_string(),
        }
    }

    /// The link that was followed, if any.
    pub fn link(&self) -> Option<&str> {
        match self {
            StandardReference::DirectLink { url } => Some(url),
            StandardReference::DecodedRedirectParam { url, .. } => Some(url),
            StandardReference::InlineText { link, .. } => link.as_deref(),
            StandardReference::Unresolved { .. } => None,
        }
    }
}

/// Resolves a navigated URL.
///
/// When the query carries `pointer_key=<encoded-target>`, the decoded target
/// is the reference; otherwise the URL itself is.
pub fn resolve_link(url: &str, pointer_key: &str) -> StandardReference {
    let query = url
        .split_once('?')
        .map(|(_, rest)| rest.split('#').next().unwrap_or(rest));

    if let Some(query) = query {
        // Percent-decoding only: a literal '+' in a file name stays a '+'.
        let target = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, value)| decode(key) == pointer_key && !value.is_empty())
            .map(|(_, value)| decode(value))
            .filter(|value| !value.is_empty());
        if let Some(target) = target {
            return StandardReference::DecodedRedirectParam {
                target,
                url: url.to_string(),
            };
        }
    }

    StandardReference::DirectLink {
        url: url.to_string(),
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
