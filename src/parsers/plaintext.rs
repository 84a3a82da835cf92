//! Plaintext fallback: each source line becomes one untimed lyric line.

use crate::model::{LyricsData, LyricsLine, LyricsWord};

pub fn parse_plaintext(input: &str) -> LyricsData {
    let lines = input
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| LyricsLine {
            start_ms: None,
            end_ms: None,
            words: vec![LyricsWord {
                start_ms: None,
                end_ms: None,
                text: l.trim_end_matches('\r').to_string(),
            }],
        })
        .collect::<Vec<_>>();
    LyricsData(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_line_becomes_one_untimed_line() {
        let data = parse_plaintext("first\nsecond\n\nthird\n");
        assert_eq!(data.len(), 3);
        assert_eq!(data.lines()[0].text(), "first");
        assert_eq!(data.lines()[0].start_ms, None);
    }
}
