//! LRC parser: plain `[MM:SS.mmm]text` lines, metadata tags, and the two
//! word-timing dialects (enhanced `<>` and bracketed `[]`), plus NE's
//! repeated-leading-timestamp idiom.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{LyricsData, LyricsLine, LyricsWord};
use crate::time::formatted_to_ms;

static LEADING_STAMPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[(\d{1,3}):(\d{2})\.(\d{1,3})\])+").unwrap());
static ONE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,3}):(\d{2})\.(\d{1,3})\]").unwrap());
static ENHANCED_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\d{1,3}):(\d{2})\.(\d{1,3})>").unwrap());
static BRACKETED_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,3}):(\d{2})\.(\d{1,3})\]").unwrap());
static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([A-Za-z]+):(.*)\]$").unwrap());

fn stamp_to_ms(cap: &regex::Captures) -> i64 {
    let m: i64 = cap[1].parse().unwrap_or(0);
    let s: i64 = cap[2].parse().unwrap_or(0);
    formatted_to_ms(m, s, &cap[3])
}

/// Parse a full LRC document into its tag map and timed lines.
pub fn parse_lrc(input: &str) -> (HashMap<String, String>, LyricsData) {
    let mut tags = HashMap::new();
    let mut lines: Vec<LyricsLine> = Vec::new();

    let cleaned = input.strip_prefix('\u{feff}').unwrap_or(input);

    for raw_line in cleaned.lines() {
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let leading = LEADING_STAMPS.find(line);
        let Some(leading_match) = leading else {
            if let Some(cap) = TAG_LINE.captures(line) {
                tags.insert(cap[1].to_ascii_lowercase(), cap[2].to_string());
            }
            continue;
        };

        let stamps: Vec<i64> = ONE_STAMP
            .captures_iter(leading_match.as_str())
            .map(|c| stamp_to_ms(&c))
            .collect();
        let remainder = &line[leading_match.end()..];

        if stamps.len() > 1 {
            // NE dialect: one line per leading stamp, identical content.
            for &start in &stamps {
                lines.push(plain_line(start, remainder));
            }
            continue;
        }

        let start = stamps[0];
        if let Some(parsed) = parse_enhanced(start, remainder) {
            lines.push(parsed);
        } else if let Some(parsed) = parse_bracketed(start, remainder) {
            lines.push(parsed);
        } else {
            lines.push(plain_line(start, remainder));
        }
    }

    let mut data = LyricsData::new(lines);
    data.0.retain(|l| !l.words.is_empty());
    (tags, data)
}

fn plain_line(start: i64, text: &str) -> LyricsLine {
    let words = sanitize_words(vec![LyricsWord {
        start_ms: Some(start),
        end_ms: None,
        text: text.to_string(),
    }]);
    LyricsLine {
        start_ms: Some(start),
        end_ms: None,
        words,
    }
}

fn sanitize_words(words: Vec<LyricsWord>) -> Vec<LyricsWord> {
    words.into_iter().filter(|w| w.text != "\r").collect()
}

fn parse_enhanced(line_start: i64, remainder: &str) -> Option<LyricsLine> {
    if !ENHANCED_STAMP.is_match(remainder) {
        return None;
    }
    let marks: Vec<(i64, usize, usize)> = ENHANCED_STAMP
        .captures_iter(remainder)
        .map(|c| {
            let m = c.get(0).unwrap();
            (stamp_to_ms(&c), m.start(), m.end())
        })
        .collect();

    let mut words = Vec::new();
    for i in 0..marks.len().saturating_sub(1) {
        let (start, _, text_start) = marks[i];
        let (end, text_end, _) = (marks[i + 1].0, marks[i + 1].1, marks[i + 1].2);
        let text = &remainder[text_start..text_end];
        words.push(LyricsWord {
            start_ms: Some(start),
            end_ms: Some(end),
            text: text.to_string(),
        });
    }
    let words = sanitize_words(words);
    let first_start = words.first().and_then(|w| w.start_ms).unwrap_or(line_start);
    Some(LyricsLine {
        start_ms: Some(first_start),
        end_ms: None,
        words,
    })
}

fn parse_bracketed(line_start: i64, remainder: &str) -> Option<LyricsLine> {
    if !BRACKETED_STAMP.is_match(remainder) {
        return None;
    }
    let marks: Vec<(i64, usize, usize)> = BRACKETED_STAMP
        .captures_iter(remainder)
        .map(|c| {
            let m = c.get(0).unwrap();
            (stamp_to_ms(&c), m.start(), m.end())
        })
        .collect();

    let mut words = Vec::new();
    let mut prev_start = line_start;
    let mut prev_text_end = 0usize;
    for (stamp_ms, text_start, text_end) in &marks {
        let text = &remainder[prev_text_end..*text_start];
        words.push(LyricsWord {
            start_ms: Some(prev_start),
            end_ms: Some(*stamp_ms),
            text: text.to_string(),
        });
        prev_start = *stamp_ms;
        prev_text_end = *text_end;
    }
    let words = sanitize_words(words);
    Some(LyricsLine {
        start_ms: Some(line_start),
        end_ms: None,
        words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_tags() {
        let (tags, _) = parse_lrc("[ti:Song]\n[ar:Artist]\n[00:01.000]hello\n");
        assert_eq!(tags.get("ti"), Some(&"Song".to_string()));
        assert_eq!(tags.get("ar"), Some(&"Artist".to_string()));
    }

    #[test]
    fn s1_enhanced_round_trip_shape() {
        let input = "[ti:Song]\n[00:01.000]<00:01.000>Hel<00:01.500>lo <00:01.700>World<00:02.000>\n";
        let (_, data) = parse_lrc(input);
        assert_eq!(data.len(), 1);
        let line = &data.lines()[0];
        assert_eq!(line.words.len(), 3);
        assert_eq!(line.words[0].text, "Hel");
        assert_eq!(line.words[0].start_ms, Some(1000));
        assert_eq!(line.words[0].end_ms, Some(1500));
        assert_eq!(line.words[2].text, "World");
        assert_eq!(line.words[2].end_ms, Some(2000));
    }

    #[test]
    fn bracketed_dialect_first_word_inherits_line_start() {
        let (_, data) = parse_lrc("[00:05.000]foo[00:05.500]bar[00:06.000]\n");
        let line = &data.lines()[0];
        assert_eq!(line.words[0].start_ms, Some(5000));
        assert_eq!(line.words[0].text, "foo");
        assert_eq!(line.words[1].start_ms, Some(5500));
        assert_eq!(line.words[1].text, "bar");
    }

    #[test]
    fn ne_repeated_timestamp_dialect_emits_one_line_per_stamp() {
        let (_, data) = parse_lrc("[00:01.000][00:02.000][00:03.000]same text\n");
        assert_eq!(data.len(), 3);
        for line in data.lines() {
            assert_eq!(line.text(), "same text");
        }
    }

    #[test]
    fn plain_timed_line_synthesizes_single_word() {
        let (_, data) = parse_lrc("[00:01.000]just text\n");
        assert_eq!(data.lines()[0].words.len(), 1);
        assert_eq!(data.lines()[0].words[0].text, "just text");
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let (_, data) = parse_lrc("\r\n[00:01.000]a\r\n\r\n[00:02.000]b\r\n");
        assert_eq!(data.len(), 2);
    }
}
