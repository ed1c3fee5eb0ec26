//! Link classification for message text.
//!
//! Offsets are byte offsets into the message text and always fall on
//! character boundaries, so `&text[span.start..span.end]` is the link text.

use once_cell::sync::Lazy;
use regex::Regex;

/// A message cross-reference: the URL ends at the message id.
static CROSS_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(https?://\S+?/servers/([^/\s]+)/channels/([^/\s]+)/messages/([^/\s]+))(?:\s|$)",
    )
    .unwrap()
});

static EXTERNAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Server id used by direct-message conversations.
pub const DM_SERVER_ID: &str = "dm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Points at another message of this application.
    CrossReference {
        server_id: String,
        channel_id: String,
        message_id: String,
        full_url: String,
    },
    External { url: String },
}

/// A half-open byte range of message text classified as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: LinkKind,
}

impl Span {
    pub fn is_cross_reference(&self) -> bool {
        matches!(self.kind, LinkKind::CrossReference { .. })
    }

    /// The matched text.
    pub fn url(&self) -> &str {
        match &self.kind {
            LinkKind::CrossReference { full_url, .. } => full_url,
            LinkKind::External { url } => url,
        }
    }

    fn contains(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }
}

/// Rendering unit produced by [`segments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link(Span),
}

/// Classify every link in `text`, sorted by start.
pub fn parse(text: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = CROSS_REFERENCE_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let url = caps.get(1)?;
            Some(Span {
                start: url.start(),
                end: url.end(),
                kind: LinkKind::CrossReference {
                    server_id: caps.get(2)?.as_str().to_string(),
                    channel_id: caps.get(3)?.as_str().to_string(),
                    message_id: caps.get(4)?.as_str().to_string(),
                    full_url: url.as_str().to_string(),
                },
            })
        })
        .collect();

    let cross_references = spans.len();
    for m in EXTERNAL_REGEX.find_iter(text) {
        let captured = spans[..cross_references]
            .iter()
            .any(|span| span.contains(m.start(), m.end()));
        if !captured {
            spans.push(Span {
                start: m.start(),
                end: m.end(),
                kind: LinkKind::External {
                    url: m.as_str().to_string(),
                },
            });
        }
    }

    spans.sort_by_key(|span| span.start);
    spans
}

/// Split `text` into alternating plain and link segments.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for span in parse(text) {
        if span.start > cursor {
            out.push(Segment::Text(&text[cursor..span.start]));
        }
        cursor = span.end;
        out.push(Segment::Link(span));
    }
    if cursor < text.len() {
        out.push(Segment::Text(&text[cursor..]));
    }
    out
}

/// Shareable link to a message.
///
/// Direct messages have no channel path and use `{base}/?message={id}`.
pub fn message_link(base: &str, server_id: &str, channel_id: &str, message_id: &str) -> String {
    let base = base.trim_end_matches('/');
    if server_id == DM_SERVER_ID {
        format!("{}/?message={}", base, message_id)
    } else {
        format!(
            "{}/servers/{}/channels/{}/messages/{}",
            base, server_id, channel_id, message_id
        )
    }
}
