use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::types::CaptionTrack;

static PLAYER_RESPONSE_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").expect("valid player response regex")
});

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    #[serde(default)]
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

impl PlayerResponse {
    /// `captions.playerCaptionsTracklistRenderer.captionTracks`, empty when
    /// any level is missing.
    pub fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.player_captions_tracklist_renderer.as_ref())
            .map(|r| r.caption_tracks.as_slice())
            .unwrap_or_default()
    }
}

/// Find the `ytInitialPlayerResponse = {...}` assignment in a watch page and
/// parse the object literal.
///
/// Parsing stops at the end of the first complete JSON value, so whatever
/// script follows the assignment does not matter.
pub fn extract_player_response(html: &str) -> Option<PlayerResponse> {
    let found = PLAYER_RESPONSE_ASSIGNMENT.find(html)?;
    // The match ends just past the opening brace.
    let json_start = found.end() - 1;
    let mut values =
        serde_json::Deserializer::from_str(&html[json_start..]).into_iter::<PlayerResponse>();
    values.next()?.ok()
}

/// Manual English track first, then any English track.
pub fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    let is_english = |t: &&CaptionTrack| t.language_code == "en";
    tracks
        .iter()
        .filter(is_english)
        .find(|t| t.is_manual())
        .or_else(|| tracks.iter().find(is_english))
}
