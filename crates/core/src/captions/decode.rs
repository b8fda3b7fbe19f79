//! Caption payload decoders.
//!
//! Both decoders are total: a malformed payload decodes to an empty string,
//! which the caption source treats as "try the next format".

use quick_xml::{Reader, events::Event};
use serde::Deserialize;
use tracing::debug;

/// Text of every `<text>` element in document order, each trimmed, empties
/// dropped, joined by single spaces.
pub fn decode_timed_text_xml(raw: &str) -> String {
    match collect_text_elements(raw) {
        Ok(parts) => parts.join(" "),
        Err(e) => {
            debug!(error = %e, "timed-text XML did not parse");
            String::new()
        }
    }
}

fn collect_text_elements(raw: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(raw);
    let mut parts = Vec::new();
    let mut current = String::new();
    // Depth inside the outermost open <text>; 0 when outside.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth > 0 {
                    depth += 1;
                } else if e.local_name().as_ref() == b"text" {
                    depth = 1;
                    current.clear();
                }
            }
            Event::End(_) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let text = current.trim();
                    if !text.is_empty() {
                        parts.push(text.to_string());
                    }
                }
            }
            Event::Text(e) if depth > 0 => {
                current.push_str(&e.unescape()?);
            }
            Event::CData(e) if depth > 0 => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parts)
}

#[derive(Deserialize)]
struct Srv3Line {
    segs: Vec<Srv3Seg>,
}

#[derive(Deserialize)]
struct Srv3Seg {
    #[serde(default)]
    utf8: String,
}

/// Decode the segmented JSON-lines ("srv3") format.
///
/// Lines not starting with `{` are skipped. Each kept line contributes the
/// concatenation of its `segs[].utf8` values; a line that fails to parse
/// contributes an empty string. Line results are joined by single spaces.
pub fn decode_segmented_json(raw: &str) -> String {
    raw.lines()
        .filter(|line| line.trim().starts_with('{'))
        .map(decode_srv3_line)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn decode_srv3_line(line: &str) -> String {
    match serde_json::from_str::<Srv3Line>(line) {
        Ok(parsed) => parsed.segs.into_iter().map(|seg| seg.utf8).collect(),
        Err(e) => {
            debug!(error = %e, "skipping malformed srv3 line");
            String::new()
        }
    }
}
