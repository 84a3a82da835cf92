//! KRC container parser: tag lines plus `[start,duration]<offset,duration,0>
//! content…` body lines, with an optional base64+JSON `language` tag
//! carrying romanization and/or translation tracks.

use base64::Engine;
use serde::Deserialize;

use crate::error::{FetchError, Result};
use crate::model::{LyricsData, LyricsLine, LyricsWord};

use super::parse_krc_style_body;

#[derive(Deserialize)]
struct LanguageBlock {
    content: Vec<LanguageEntry>,
}

#[derive(Deserialize)]
struct LanguageEntry {
    #[serde(rename = "type")]
    kind: i64,
    content: Vec<Vec<String>>,
}

pub struct KrcParsed {
    pub tags: std::collections::HashMap<String, String>,
    pub orig: LyricsData,
    pub roma: Option<LyricsData>,
    pub ts: Option<LyricsData>,
}

/// Parse an already cipher-decrypted KRC body string.
pub fn parse_krc(body: &str) -> Result<KrcParsed> {
    let (tags, orig) = parse_krc_style_body(body);

    let (roma, ts) = match tags.get("language") {
        Some(encoded) => {
            let raw = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| FetchError::Decrypt(format!("krc language base64: {e}")))?;
            let block: LanguageBlock = serde_json::from_slice(&raw)
                .map_err(|e| FetchError::Processing(format!("krc language json: {e}")))?;
            build_language_tracks(&orig, &block)
        }
        None => (None, None),
    };

    Ok(KrcParsed { tags, orig, roma, ts })
}

fn build_language_tracks(
    orig: &LyricsData,
    block: &LanguageBlock,
) -> (Option<LyricsData>, Option<LyricsData>) {
    let mut roma = None;
    let mut ts = None;

    for entry in &block.content {
        match entry.kind {
            0 => {
                let mut roma_lines = Vec::new();
                let mut groups = entry.content.iter();
                for line in orig.lines() {
                    if line.words.iter().all(|w| w.text.trim().is_empty()) {
                        continue; // advance the offset counter without consuming an entry
                    }
                    let Some(group) = groups.next() else { break };
                    let words: Vec<LyricsWord> = line
                        .words
                        .iter()
                        .zip(group.iter())
                        .map(|(orig_word, text)| LyricsWord {
                            start_ms: orig_word.start_ms,
                            end_ms: orig_word.end_ms,
                            text: text.clone(),
                        })
                        .collect();
                    roma_lines.push(LyricsLine {
                        start_ms: line.start_ms,
                        end_ms: line.end_ms,
                        words,
                    });
                }
                roma = Some(LyricsData::new(roma_lines));
            }
            1 => {
                let mut ts_lines = Vec::new();
                for (line, group) in orig.lines().iter().zip(entry.content.iter()) {
                    let text = group.first().cloned().unwrap_or_default();
                    ts_lines.push(LyricsLine {
                        start_ms: line.start_ms,
                        end_ms: line.end_ms,
                        words: vec![LyricsWord {
                            start_ms: line.start_ms,
                            end_ms: line.end_ms,
                            text,
                        }],
                    });
                }
                ts = Some(LyricsData::new(ts_lines));
            }
            _ => {}
        }
    }

    (roma, ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_without_language_block() {
        let body = "[1000,500]<0,500,0>Hi";
        let parsed = parse_krc(body).unwrap();
        assert_eq!(parsed.orig.len(), 1);
        assert!(parsed.roma.is_none());
        assert!(parsed.ts.is_none());
    }

    #[test]
    fn s4_language_block_produces_roma_and_ts() {
        let lang_json = serde_json::json!({
            "content": [
                {"type": 0, "content": [["ro1", "ro2"], ["ro3", "ro4"]]},
                {"type": 1, "content": [["trans one"], ["trans two"]]},
            ]
        });
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(serde_json::to_vec(&lang_json).unwrap());
        let body = format!(
            "[language:{encoded}]\n[1000,500]<0,250,0>wa<250,250,0>wb\n[2000,500]<0,250,0>wc<250,250,0>wd\n"
        );
        let parsed = parse_krc(&body).unwrap();
        assert_eq!(parsed.orig.len(), 2);
        let roma = parsed.roma.unwrap();
        assert_eq!(roma.len(), 2);
        assert_eq!(roma.lines()[0].words[0].text, "ro1");
        let ts = parsed.ts.unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.lines()[0].text(), "trans one");
    }
}
