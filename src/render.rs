//! LRC renderer (component I): header + body rendering for line/verbatim/
//! enhanced modes, offset application, and three-tier translation
//! alignment.

use std::collections::HashMap;

use crate::model::{LyricsData, LyricsLine, Mode};
use crate::time::ms_to_formatted;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub mode: Mode,
    pub offset_ms: i64,
    pub ms_digits: u8,
    pub include_translation: bool,
    /// Append a trailing end-of-track timestamp-only marker line.
    pub end_timestamp: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            mode: Mode::Line,
            offset_ms: 0,
            ms_digits: 3,
            include_translation: false,
            end_timestamp: false,
        }
    }
}

fn apply_offset(ms: Option<i64>, offset: i64) -> Option<i64> {
    ms.map(|m| (m + offset).max(0))
}

fn render_header(tags: &HashMap<String, String>, offset_ms: i64) -> String {
    let mut out = String::new();
    for key in ["ti", "ar", "al", "by"] {
        if let Some(v) = tags.get(key) {
            if !v.is_empty() {
                out.push_str(&format!("[{key}:{v}]\n"));
            }
        }
    }
    if offset_ms != 0 {
        out.push_str(&format!("[offset:{offset_ms}]\n"));
    }
    out.push_str("[tool:lddc-fetch-core]\n");
    out
}

fn render_line_mode_body(line: &LyricsLine, offset: i64, digits: u8) -> String {
    let start = apply_offset(line.effective_start(), offset).unwrap_or(0);
    format!("[{}]{}", ms_to_formatted(start, digits), line.text())
}

fn render_word_mode_body(
    line: &LyricsLine,
    offset: i64,
    digits: u8,
    open: char,
    close: char,
    inherit_first: bool,
) -> String {
    let line_start = apply_offset(line.effective_start(), offset);
    let mut out = format!("[{}]", ms_to_formatted(line_start.unwrap_or(0), digits));

    let mut prev_end = if inherit_first { line_start } else { None };
    for w in &line.words {
        let start = apply_offset(w.start_ms, offset);
        let end = apply_offset(w.end_ms, offset);
        let emit_start = match (start, prev_end) {
            (Some(s), Some(pe)) => s != pe,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if emit_start {
            if let Some(s) = start {
                out.push_str(&format!("{open}{}{close}", ms_to_formatted(s, digits)));
            }
        }
        out.push_str(&w.text);
        if let Some(e) = end {
            out.push_str(&format!("{open}{}{close}", ms_to_formatted(e, digits)));
        }
        prev_end = end;
    }

    if line.words.last().map(|w| w.end_ms.is_none()).unwrap_or(true) {
        if let Some(line_end) = apply_offset(line.effective_end(), offset) {
            out.push_str(&format!("{open}{}{close}", ms_to_formatted(line_end, digits)));
        }
    }
    out
}

fn render_line_body(line: &LyricsLine, opts: &RenderOptions) -> String {
    match opts.mode {
        Mode::Line => render_line_mode_body(line, opts.offset_ms, opts.ms_digits),
        Mode::Verbatim => {
            render_word_mode_body(line, opts.offset_ms, opts.ms_digits, '[', ']', true)
        }
        Mode::Enhanced => {
            render_word_mode_body(line, opts.offset_ms, opts.ms_digits, '<', '>', false)
        }
    }
}

/// Three-tier translation alignment: exact start match, then (when lengths
/// are equal and the exact pass left gaps) positional fill, then
/// nearest-start for anything still unmapped. Ordering is load-bearing:
/// exact beats positional beats nearest, never the reverse.
pub fn align_translation(orig: &LyricsData, ts: &LyricsData) -> Vec<Option<usize>> {
    let mut result = vec![None; orig.len()];
    let start_map: HashMap<i64, usize> = ts
        .lines()
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.effective_start().map(|s| (s, i)))
        .collect();

    let mut mapped_count = 0;
    for (i, line) in orig.lines().iter().enumerate() {
        if let Some(s) = line.effective_start() {
            if let Some(&j) = start_map.get(&s) {
                result[i] = Some(j);
                mapped_count += 1;
            }
        }
    }

    if orig.len() == ts.len() && mapped_count < orig.len() {
        for (i, slot) in result.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(i);
            }
        }
        return result;
    }

    for (i, line) in orig.lines().iter().enumerate() {
        if result[i].is_some() {
            continue;
        }
        let Some(s) = line.effective_start() else { continue };
        let nearest = ts
            .lines()
            .iter()
            .enumerate()
            .filter_map(|(j, l)| l.effective_start().map(|ts_s| (j, (ts_s - s).abs())))
            .min_by_key(|&(_, d)| d);
        if let Some((j, _)) = nearest {
            result[i] = Some(j);
        }
    }
    result
}

/// Render a bundle's `orig` (and, if requested, aligned `ts`) as an LRC
/// string. Returns an empty-body-but-headered string if `orig` is `None`;
/// callers enforce the not-found rule at the coordinator level.
pub fn render_lrc(
    tags: &HashMap<String, String>,
    orig: &LyricsData,
    ts: Option<&LyricsData>,
    opts: &RenderOptions,
) -> String {
    let mut out = render_header(tags, opts.offset_ms);
    out.push('\n');

    let alignment = match (opts.include_translation, ts) {
        (true, Some(ts_data)) if !ts_data.is_empty() => Some(align_translation(orig, ts_data)),
        _ => None,
    };

    let mut body = String::new();
    let mut last_end: Option<i64> = None;
    for (i, line) in orig.lines().iter().enumerate() {
        body.push_str(&render_line_body(line, opts));
        body.push('\n');
        last_end = apply_offset(line.effective_end(), opts.offset_ms);

        if let (Some(alignment), Some(ts_data)) = (&alignment, ts) {
            if let Some(Some(j)) = alignment.get(i) {
                if let Some(ts_line) = ts_data.lines().get(*j) {
                    let mut line_opts = opts.clone();
                    line_opts.mode = Mode::Line;
                    let ts_rendered_start = apply_offset(line.effective_start(), opts.offset_ms).unwrap_or(0);
                    body.push_str(&format!(
                        "[{}]{}\n",
                        ms_to_formatted(ts_rendered_start, opts.ms_digits),
                        ts_line.text()
                    ));
                }
            }
        }
    }

    if opts.end_timestamp {
        if let Some(end) = last_end {
            body.push_str(&format!("[{}]\n", ms_to_formatted(end, opts.ms_digits)));
        }
    }

    out.push_str(&body);
    out.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::lrc::parse_lrc;

    #[test]
    fn s1_enhanced_round_trip_render() {
        let input = "[ti:Song]\n[00:01.000]<00:01.000>Hel<00:01.500>lo <00:01.700>World<00:02.000>\n";
        let (tags, data) = parse_lrc(input);
        let opts = RenderOptions { mode: Mode::Enhanced, ..Default::default() };
        let rendered = render_lrc(&tags, &data, None, &opts);
        assert!(rendered.contains("[00:01.000]<00:01.000>Hel<00:01.500>lo <00:01.700>World<00:02.000>"));
        assert!(rendered.contains("[ti:Song]"));
        assert!(rendered.contains("[tool:lddc-fetch-core]"));
    }

    #[test]
    fn s2_positional_fallback_when_lengths_match_and_no_exact() {
        use crate::model::{LyricsLine, LyricsWord};
        let mk = |start: i64, text: &str| LyricsLine {
            start_ms: Some(start),
            end_ms: None,
            words: vec![LyricsWord { start_ms: Some(start), end_ms: None, text: text.to_string() }],
        };
        let orig = LyricsData::new(vec![mk(1000, "a"), mk(2000, "b"), mk(3000, "c")]);
        let ts = LyricsData::new(vec![mk(9999, "x"), mk(8888, "y"), mk(7777, "z")]);
        // LyricsData::new sorts ascending, so re-derive expected order after sort.
        let alignment = align_translation(&orig, &ts);
        assert_eq!(alignment, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        assert_eq!(apply_offset(Some(100), -500), Some(0));
    }

    #[test]
    fn placeholder_lines_are_absent_after_cleaning() {
        use crate::model::{LyricsLine, LyricsWord};
        let mut data = LyricsData::new(vec![LyricsLine {
            start_ms: Some(0),
            end_ms: None,
            words: vec![LyricsWord { start_ms: Some(0), end_ms: None, text: "//".into() }],
        }]);
        data.drop_placeholders();
        let tags = HashMap::new();
        let rendered = render_lrc(&tags, &data, None, &RenderOptions::default());
        assert!(!rendered.contains("//"));
    }
}
