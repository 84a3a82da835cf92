//! Canonical in-memory lyric model (component C).

use std::collections::HashMap;

/// Closed enumeration of supported providers. Caller-supplied ordering is
/// used as a tie-break in ranking, not defined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Lrclib,
    Qm,
    Kg,
    Ne,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Lrclib => "LRCLIB",
            Source::Qm => "QM",
            Source::Kg => "KG",
            Source::Ne => "NE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LRCLIB" => Some(Source::Lrclib),
            "QM" => Some(Source::Qm),
            "KG" => Some(Source::Kg),
            "NE" => Some(Source::Ne),
            _ => None,
        }
    }
}

/// Ordered, deduplicated (by first occurrence) sequence of artist names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artist(Vec<String>);

impl Artist {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for n in names {
            if n.is_empty() {
                continue;
            }
            if seen.insert(n.clone()) {
                out.push(n);
            }
        }
        Artist(out)
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self::new(std::iter::once(name.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Join with `/`, the default separator.
    pub fn join(&self) -> String {
        self.0.join("/")
    }
}

/// Provider-private hints carried from `search` to `get_lyrics` (e.g. KG's
/// `hash`). Modeled as an opaque string-keyed map: only the owning provider
/// reads it, the coordinator treats it as a transparent bag.
pub type Extra = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Song {
    pub source: Option<Source>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<Artist>,
    pub album: Option<String>,
    pub duration_ms: Option<i64>,
    pub extra: Extra,
}

impl Song {
    /// `"{artist} - {title}"`, falling back gracefully when either side is
    /// missing. Used for logging and keyword building.
    pub fn artist_title(&self) -> String {
        match (&self.artist, &self.title) {
            (Some(a), Some(t)) if !a.is_empty() => format!("{} - {}", a.join(), t),
            (_, Some(t)) => t.clone(),
            (Some(a), None) if !a.is_empty() => a.join(),
            _ => String::new(),
        }
    }

    /// Deduplication fingerprint: `(source, id, title, artist, album, duration_ms)`.
    pub fn fingerprint(&self) -> (String, String, String, String, String, String) {
        (
            self.source.map(|s| s.as_str().to_string()).unwrap_or_default(),
            self.id.clone().unwrap_or_default(),
            self.title.clone().unwrap_or_default(),
            self.artist.as_ref().map(Artist::join).unwrap_or_default(),
            self.album.clone().unwrap_or_default(),
            self.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricsWord {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsLine {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub words: Vec<LyricsWord>,
}

impl LyricsLine {
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }

    /// Effective start: first word's start if known, else the line's own.
    pub fn effective_start(&self) -> Option<i64> {
        self.words
            .first()
            .and_then(|w| w.start_ms)
            .or(self.start_ms)
    }

    /// Effective end: last word's end if known, else the line's own.
    pub fn effective_end(&self) -> Option<i64> {
        self.words.last().and_then(|w| w.end_ms).or(self.end_ms)
    }
}

/// Ordered lyric lines, sorted ascending by `start_ms` with nulls backfilled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsData(pub Vec<LyricsLine>);

impl LyricsData {
    pub fn new(mut lines: Vec<LyricsLine>) -> Self {
        lines.sort_by(|a, b| {
            a.effective_start()
                .unwrap_or(0)
                .cmp(&b.effective_start().unwrap_or(0))
        });
        for i in 0..lines.len().saturating_sub(1) {
            if lines[i].end_ms.is_none() {
                lines[i].end_ms = lines[i + 1].effective_start();
            }
        }
        LyricsData(lines)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn lines(&self) -> &[LyricsLine] {
        &self.0
    }

    /// Drop lines whose joined text is exactly `"//"` (QM placeholder artifact).
    pub fn drop_placeholders(&mut self) {
        self.0.retain(|l| l.text() != "//");
    }
}

#[derive(Debug, Clone, Default)]
pub struct LyricsBundle {
    pub song: Song,
    pub tags: HashMap<String, String>,
    pub orig: Option<LyricsData>,
    pub ts: Option<LyricsData>,
    pub roma: Option<LyricsData>,
}

impl LyricsBundle {
    pub fn clean_placeholders(&mut self) {
        if let Some(orig) = &mut self.orig {
            orig.drop_placeholders();
        }
        if let Some(ts) = &mut self.ts {
            ts.drop_placeholders();
        }
    }
}

/// Render mode for LRC output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Line,
    Verbatim,
    Enhanced,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Line
    }
}

/// Caller-requested translation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Translation {
    #[default]
    None,
    Provider,
    Openai,
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_dedupes_preserving_first_occurrence() {
        let a = Artist::new(["x".to_string(), "y".to_string(), "x".to_string()]);
        assert_eq!(a.names(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn lyrics_data_sorts_and_backfills_end() {
        let data = LyricsData::new(vec![
            LyricsLine {
                start_ms: Some(2000),
                end_ms: None,
                words: vec![LyricsWord { start_ms: Some(2000), end_ms: None, text: "b".into() }],
            },
            LyricsLine {
                start_ms: Some(1000),
                end_ms: None,
                words: vec![LyricsWord { start_ms: Some(1000), end_ms: None, text: "a".into() }],
            },
        ]);
        assert_eq!(data.lines()[0].text(), "a");
        assert_eq!(data.lines()[0].end_ms, Some(2000));
    }

    #[test]
    fn drop_placeholders_removes_slash_slash_lines() {
        let mut data = LyricsData::new(vec![LyricsLine {
            start_ms: Some(0),
            end_ms: None,
            words: vec![LyricsWord { start_ms: Some(0), end_ms: None, text: "//".into() }],
        }]);
        data.drop_placeholders();
        assert!(data.is_empty());
    }
}
