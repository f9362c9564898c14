//! Caption track selection and `json3` timed-text parsing.

use crate::{
    types::{CaptionTrack, TimedText},
    yt::TranscriptEntry,
};

const TARGET_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq)]
pub struct TrackChoice<'a> {
    pub track: &'a CaptionTrack,
    /// Ask YouTube to machine-translate the track into English
    pub translate: bool,
}

impl TrackChoice<'_> {
    pub fn url(&self) -> String {
        track_url(self.track, self.translate)
    }

    /// The same track without translation
    pub fn original_url(&self) -> String {
        track_url(self.track, false)
    }
}

fn is_english(track: &CaptionTrack) -> bool {
    track.language_code == TARGET_LANGUAGE
        || track
            .language_code
            .starts_with(&format!("{TARGET_LANGUAGE}-"))
}

/// Manual English, then auto-generated English, then the first track
/// translated to English when YouTube allows it
pub fn select_track(tracks: &[CaptionTrack]) -> Option<TrackChoice<'_>> {
    let manual = tracks
        .iter()
        .find(|t| is_english(t) && !t.is_auto_generated());
    let auto = || tracks.iter().find(|t| is_english(t) && t.is_auto_generated());

    if let Some(track) = manual.or_else(auto) {
        return Some(TrackChoice {
            track,
            translate: false,
        });
    }

    tracks.first().map(|track| TrackChoice {
        track,
        translate: track.is_translatable,
    })
}

pub fn track_url(track: &CaptionTrack, translate: bool) -> String {
    let mut url = format!("{}&fmt=json3", track.base_url);
    if translate {
        url.push_str("&tlang=");
        url.push_str(TARGET_LANGUAGE);
    }
    url
}

/// Parses a `fmt=json3` caption payload, dropping events with no text
pub fn parse_timed_text(raw: &str) -> Result<Vec<TranscriptEntry>, crate::error::Error> {
    let timed = serde_json::from_str::<TimedText>(raw)?;

    Ok(timed
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
                .trim()
                .to_string();

            (!text.is_empty()).then(|| TranscriptEntry {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect())
}
