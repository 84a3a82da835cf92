//! Format parsers (component D): QRC, KRC, YRC, LRC (with its dialects),
//! and a plaintext fallback — all funnel into the shared [`LyricsData`]
//! model.

pub mod krc;
pub mod lrc;
pub mod plaintext;
pub mod qrc;
pub mod yrc;

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{LyricsLine, LyricsWord};

/// `[start_ms,duration_ms]` line-leader shared by QRC/KRC/YRC bodies.
pub(crate) static LINE_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+),(\d+)\]").unwrap());

/// QRC word token: `text(start_offset,duration)`.
pub(crate) static QRC_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^()]*)\((\d+),(\d+)\)").unwrap());

/// KRC/YRC word token: `<start_offset,duration,0>text`.
pub(crate) static KRC_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\d+),(\d+),\d+>([^<]*)").unwrap());

/// Build a [`LyricsLine`] from `(offset, duration, text)` word tuples where
/// offsets are relative to `line_start_ms`. Drops a word whose content is a
/// lone `"\r"` (a QRC artifact); synthesizes a single full-line word when no
/// per-word split was found.
pub(crate) fn build_line(
    line_start_ms: i64,
    line_duration_ms: i64,
    words: Vec<(i64, i64, String)>,
    full_text_fallback: &str,
) -> LyricsLine {
    let mut built: Vec<LyricsWord> = words
        .into_iter()
        .filter(|(_, _, text)| text != "\r")
        .map(|(offset, duration, text)| LyricsWord {
            start_ms: Some(line_start_ms + offset),
            end_ms: Some(line_start_ms + offset + duration),
            text,
        })
        .collect();

    if built.is_empty() && !full_text_fallback.is_empty() {
        built.push(LyricsWord {
            start_ms: Some(line_start_ms),
            end_ms: Some(line_start_ms + line_duration_ms),
            text: full_text_fallback.to_string(),
        });
    }

    LyricsLine {
        start_ms: Some(line_start_ms),
        end_ms: Some(line_start_ms + line_duration_ms),
        words: built,
    }
}

/// Unescape the handful of XML entities used inside `LyricContent="..."`.
pub(crate) fn unescape_xml(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([A-Za-z]+):(.*)\]$").unwrap());

/// Shared KRC/YRC body grammar: tag lines interleaved with
/// `[start,duration]<offset,duration,0>content…` lines.
pub(crate) fn parse_krc_style_body(
    input: &str,
) -> (std::collections::HashMap<String, String>, crate::model::LyricsData) {
    let mut tags = std::collections::HashMap::new();
    let mut lines = Vec::new();

    for raw_line in input.lines() {
        let line = raw_line.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }
        let Some(leader) = LINE_LEADER.find(line) else {
            if let Some(cap) = TAG_LINE.captures(line) {
                tags.insert(cap[1].to_ascii_lowercase(), cap[2].to_string());
            }
            continue;
        };
        let leader_cap = LINE_LEADER.captures(line).unwrap();
        let start: i64 = leader_cap[1].parse().unwrap_or(0);
        let duration: i64 = leader_cap[2].parse().unwrap_or(0);
        let rest = &line[leader.end()..];

        let words: Vec<(i64, i64, String)> = KRC_WORD
            .captures_iter(rest)
            .map(|c| {
                let offset: i64 = c[1].parse().unwrap_or(0);
                let dur: i64 = c[2].parse().unwrap_or(0);
                (offset, dur, c[3].to_string())
            })
            .collect();

        lines.push(build_line(start, duration, words, rest));
    }

    (tags, crate::model::LyricsData::new(lines))
}
