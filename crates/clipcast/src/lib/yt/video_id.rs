use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

const WATCH_BASE_URL: &str = "https://www.youtube.com/watch";

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_BASE_URL}?v={video_id}")
}

/// Pulls the 11-character video id out of a YouTube URL, or accepts a bare id.
///
/// Handles `youtube.com/watch?v=`, `/shorts/<id>`, `/live/<id>`, `/embed/<id>`
/// on any youtube.com subdomain, and `youtu.be/<id>`.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if VIDEO_ID_RE.is_match(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(String::from)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts" | "live" | "embed") => segments.next().map(String::from),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| VIDEO_ID_RE.is_match(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_known_url_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ/extra?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=10",
            "youtu.be/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
            "  dQw4w9WgXcQ\n",
        ];
        for case in cases {
            assert_eq!(
                extract_video_id(case).as_deref(),
                Some("dQw4w9WgXcQ"),
                "failed on {case}"
            );
        }
    }

    #[test]
    fn rejects_other_inputs() {
        let cases = [
            "",
            "not a url",
            "https://vimeo.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/channel/UCbuilds0000000000000001",
            "https://notyoutube.com/watch?v=dQw4w9WgXcQ",
            "dQw4w9WgXcQ!",
        ];
        for case in cases {
            assert_eq!(extract_video_id(case), None, "accepted {case}");
        }
    }

    #[test]
    fn watch_url_round_trips() {
        let url = watch_url("dQw4w9WgXcQ");
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(extract_video_id(&url).as_deref(), Some("dQw4w9WgXcQ"));
    }
}
