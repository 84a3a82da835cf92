//! QRC container parser: `<Lyric_1 LyricType="1" LyricContent="…"/>` wrapping
//! a body of `[start,duration]text(start_offset,duration)…` lines.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FetchError, Result};
use crate::model::LyricsData;

use super::{build_line, unescape_xml, LINE_LEADER, QRC_WORD};

static LYRIC_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"LyricContent="((?:[^"\\]|\\.)*)""#).unwrap());

/// Parse an already cipher-decrypted QRC XML envelope into a tag map (empty,
/// QRC carries no metadata tags) and the body's [`LyricsData`].
pub fn parse_qrc(envelope: &str) -> Result<(HashMap<String, String>, LyricsData)> {
    let cap = LYRIC_CONTENT
        .captures(envelope)
        .ok_or_else(|| FetchError::Processing("QRC envelope missing LyricContent".into()))?;
    let body = unescape_xml(&cap[1]);

    let mut lines = Vec::new();
    for raw_line in body.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(leader) = LINE_LEADER.find(line) else {
            continue;
        };
        let leader_cap = LINE_LEADER.captures(line).unwrap();
        let start: i64 = leader_cap[1].parse().unwrap_or(0);
        let duration: i64 = leader_cap[2].parse().unwrap_or(0);
        let rest = &line[leader.end()..];

        let words: Vec<(i64, i64, String)> = QRC_WORD
            .captures_iter(rest)
            .map(|c| {
                let offset: i64 = c[2].parse().unwrap_or(0);
                let dur: i64 = c[3].parse().unwrap_or(0);
                (offset, dur, c[1].to_string())
            })
            .collect();

        lines.push(build_line(start, duration, words, rest));
    }

    Ok((HashMap::new(), LyricsData::new(lines)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_with_words() {
        let envelope = r#"<Lyric_1 LyricType="1" LyricContent="[1000,1000]Hel(0,500)lo(500,500)"/>"#;
        let (_, data) = parse_qrc(envelope).unwrap();
        assert_eq!(data.len(), 1);
        let line = &data.lines()[0];
        assert_eq!(line.words.len(), 2);
        assert_eq!(line.words[0].text, "Hel");
        assert_eq!(line.words[0].start_ms, Some(1000));
        assert_eq!(line.words[0].end_ms, Some(1500));
        assert_eq!(line.words[1].start_ms, Some(1500));
    }

    #[test]
    fn missing_lyric_content_is_a_processing_error() {
        let envelope = r#"<Lyric_1 LyricType="1"/>"#;
        assert!(parse_qrc(envelope).is_err());
    }

    #[test]
    fn falls_back_to_single_word_when_unsplit() {
        let envelope = r#"<Lyric_1 LyricType="1" LyricContent="[1000,500]plain text"/>"#;
        let (_, data) = parse_qrc(envelope).unwrap();
        assert_eq!(data.lines()[0].words.len(), 1);
        assert_eq!(data.lines()[0].words[0].text, "plain text");
    }
}
