//! Caption extraction: track discovery on the watch page, payload fetching
//! with format fallback, and payload decoding.

pub mod decode;
pub mod source;
pub mod track;

pub use decode::{decode_segmented_json, decode_timed_text_xml};
pub use source::{TranscriptSource, YoutubeCaptions};
pub use track::{PlayerResponse, extract_player_response, select_track};
