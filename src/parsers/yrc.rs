//! YRC container parser: identical timing grammar to KRC, minus the
//! cipher and the `language` translation/romanization block.

use crate::model::LyricsData;

use super::parse_krc_style_body;

/// Parse an already-decoded YRC body string into its tags and lines.
pub fn parse_yrc(body: &str) -> (std::collections::HashMap<String, String>, LyricsData) {
    parse_krc_style_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_lines() {
        let (_, data) = parse_yrc("[1000,500]<0,250,0>wa<250,250,0>wb\n");
        assert_eq!(data.len(), 1);
        assert_eq!(data.lines()[0].words.len(), 2);
    }
}
