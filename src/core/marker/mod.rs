//! # Marker Module
//!
//! The placeholder codec: encodes a descriptor into an inline marker that
//! survives embedding in generated HTML, and decodes every marker back out of
//! finished content.
//!
//! A marker is an HTML comment envelope carrying the descriptor's wire JSON,
//! immediately followed by a provisional URL path. The comment is invisible to
//! any text processing that does not understand markers, while the path keeps
//! the surrounding markup well-formed until the rewrite pass replaces both.

use crate::core::config::PipelineOptions;
use crate::core::descriptor::Descriptor;
use crate::core::identity;
use crate::error::DescriptorError;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const MARKER_OPEN: &str = "<!-- SHARP_IMAGE ";
const MARKER_CLOSE: &str = " -->";

/// Payload is matched non-greedily so consecutive markers in the same text
/// are each matched independently; the provisional path is the literal run of
/// characters up to the next quote or whitespace.
fn marker_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<!-- SHARP_IMAGE (.*?) -->([^"'\s]*)"#).expect("marker pattern is valid")
    })
}

/// Encode a descriptor into its marker envelope
pub fn encode(descriptor: &Descriptor) -> String {
    let payload = serde_json::to_string(descriptor)
        .expect("descriptor serialization cannot fail for plain JSON values");
    format!("{MARKER_OPEN}{payload}{MARKER_CLOSE}")
}

/// Marker envelope followed by the provisional URL path.
///
/// This is what the `getUrl` shortcode renders into content at render time.
pub fn emit_url(descriptor: &Descriptor, options: &PipelineOptions) -> String {
    let provisional = options.url_for(&identity::provisional_file_name(descriptor));
    format!("{}{provisional}", encode(descriptor))
}

/// One decoded marker and the span it occupies in the scanned text.
///
/// The span covers the envelope and the trailing provisional path, i.e.
/// exactly the bytes the rewrite pass replaces.
#[derive(Debug, Clone)]
pub struct MarkerMatch {
    pub descriptor: Descriptor,
    pub span: Range<usize>,
}

/// Decode every marker in `text`, in document order.
///
/// A malformed payload fails the whole decode: a marker that does not parse
/// indicates a producer bug upstream, and partial output with dangling
/// references is worse than a failed build.
pub fn decode_all(text: &str) -> Result<Vec<MarkerMatch>, DescriptorError> {
    let mut matches = Vec::new();

    for captures in marker_regex().captures_iter(text) {
        let whole = captures.get(0).expect("capture group 0 is always present");
        let payload = captures
            .get(1)
            .expect("marker pattern has a payload group")
            .as_str();

        let descriptor = serde_json::from_str(payload).map_err(|source| {
            DescriptorError::MalformedMarker {
                snippet: snippet(payload),
                source,
            }
        })?;

        matches.push(MarkerMatch {
            descriptor,
            span: whole.range(),
        });
    }

    Ok(matches)
}

fn snippet(payload: &str) -> String {
    const MAX: usize = 60;
    if payload.len() <= MAX {
        payload.to_string()
    } else {
        let mut end = MAX;
        while !payload.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &payload[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Descriptor {
        Descriptor::new("photo.jpg")
            .with_operation("resize", vec![json!(200), json!(200)])
            .with_operation("toFormat", vec![json!("webp")])
    }

    #[test]
    fn encode_wraps_wire_json_in_comment() {
        let marker = encode(&sample());

        assert!(marker.starts_with("<!-- SHARP_IMAGE {"));
        assert!(marker.ends_with("} -->"));
        assert!(marker.contains(r#""inputPath":"photo.jpg""#));
    }

    #[test]
    fn emit_url_appends_provisional_path() {
        let emitted = emit_url(&sample(), &PipelineOptions::default());

        // Provisional path keeps the input extension; the rewrite pass applies
        // the format override.
        assert!(emitted.contains("-->/assets/images/photo-"));
        assert!(emitted.ends_with(".jpg"));
    }

    #[test]
    fn decode_round_trips_emitted_marker() {
        let descriptor = sample();
        let text = format!(
            r#"<img src="{}">"#,
            emit_url(&descriptor, &PipelineOptions::default())
        );

        let matches = decode_all(&text).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].descriptor, descriptor);
    }

    #[test]
    fn span_covers_marker_and_provisional_path() {
        let emitted = emit_url(&sample(), &PipelineOptions::default());
        let text = format!(r#"before <img src="{emitted}"> after"#);

        let matches = decode_all(&text).unwrap();

        assert_eq!(&text[matches[0].span.clone()], emitted);
    }

    #[test]
    fn consecutive_markers_match_independently() {
        let options = PipelineOptions::default();
        let first = sample();
        let second = Descriptor::new("banner.png");
        let text = format!(
            "{} {}",
            emit_url(&first, &options),
            emit_url(&second, &options)
        );

        let matches = decode_all(&text).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].descriptor, first);
        assert_eq!(matches[1].descriptor, second);
    }

    #[test]
    fn provisional_path_stops_at_quote() {
        let text = format!(r#"src="{}" alt="x""#, emit_url(&sample(), &PipelineOptions::default()));

        let matches = decode_all(&text).unwrap();

        assert!(!text[matches[0].span.clone()].contains("alt"));
    }

    #[test]
    fn text_without_markers_decodes_empty() {
        let matches = decode_all("<p>no images here</p>").unwrap();

        assert!(matches.is_empty());
    }

    #[test]
    fn malformed_payload_fails_decode() {
        let text = "<!-- SHARP_IMAGE {broken -->x/path.jpg";

        let error = decode_all(text).unwrap_err();

        assert!(error.to_string().contains("{broken"));
    }

    #[test]
    fn malformed_marker_fails_even_with_valid_siblings() {
        let good = emit_url(&sample(), &PipelineOptions::default());
        let text = format!("{good} <!-- SHARP_IMAGE [] -->x");

        assert!(decode_all(&text).is_err());
    }
}
