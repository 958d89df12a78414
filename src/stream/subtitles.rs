//! Subtitle conversion
//!
//! Browsers only attach WebVTT text tracks, while providers mostly serve SRT.
//! Converts on the fly for the subtitle relay.

/// MIME type served for converted tracks
pub const WEBVTT_CONTENT_TYPE: &str = "text/vtt; charset=utf-8";

/// Check whether content already is WebVTT
pub fn is_webvtt(content: &str) -> bool {
    strip_bom(content).trim_start().starts_with("WEBVTT")
}

/// Return WebVTT for either SRT or WebVTT input
pub fn to_webvtt(content: &str) -> String {
    if is_webvtt(content) {
        strip_bom(content).replace("\r\n", "\n")
    } else {
        srt_to_webvtt(content)
    }
}

/// Convert SRT content to WebVTT format
///
/// Converts SRT timestamps (00:00:00,000) to WebVTT format (00:00:00.000)
/// and adds the required WEBVTT header. Dialogue lines are left untouched.
pub fn srt_to_webvtt(srt: &str) -> String {
    let mut webvtt = String::from("WEBVTT\n\n");

    for line in strip_bom(srt).lines() {
        let line = line.trim_end_matches('\r');
        if line.contains(" --> ") {
            webvtt.push_str(&line.replace(',', "."));
        } else {
            webvtt.push_str(line);
        }
        webvtt.push('\n');
    }

    webvtt
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_to_webvtt() {
        let srt = "1\n00:00:01,000 --> 00:00:04,500\nHello, world\n";
        let vtt = srt_to_webvtt(srt);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:01.000 --> 00:00:04.500"));
        // Commas in dialogue stay
        assert!(vtt.contains("Hello, world"));
    }

    #[test]
    fn test_crlf_and_bom() {
        let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n";
        let vtt = srt_to_webvtt(srt);
        assert_eq!(vtt, "WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000\nHi\n");
    }

    #[test]
    fn test_webvtt_passthrough() {
        let vtt = "WEBVTT\r\n\r\n00:01.000 --> 00:02.000\r\nHi\r\n";
        assert!(is_webvtt(vtt));
        assert_eq!(to_webvtt(vtt), "WEBVTT\n\n00:01.000 --> 00:02.000\nHi\n");
    }
}
