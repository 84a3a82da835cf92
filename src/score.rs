//! Candidate scoring and ranking (component E): title/artist normalization
//! plus a Ratcliff/Obershelp-style similarity ratio.

use std::sync::LazyLock;

use regex::Regex;

/// Fullwidth -> halfwidth punctuation pairs used during normalization
/// (Unicode Fullwidth/Halfwidth Forms block, `\u{FF01}..=\u{FF5E}` mirrors
/// ASCII `!..~` shifted by `0xFEE0`, plus the ideographic space/comma/period
/// that fall outside that block).
const FULLWIDTH_MAP: &[(char, char)] = &[
    ('\u{FF08}', '('),
    ('\u{FF09}', ')'),
    ('\u{FF3B}', '['),
    ('\u{FF3D}', ']'),
    ('\u{FF5B}', '{'),
    ('\u{FF5D}', '}'),
    ('\u{FF0C}', ','),
    ('\u{3001}', ','),
    ('\u{FF0E}', '.'),
    ('\u{3002}', '.'),
    ('\u{FF1A}', ':'),
    ('\u{FF1B}', ';'),
    ('\u{FF01}', '!'),
    ('\u{FF1F}', '?'),
    ('\u{FF5E}', '~'),
    ('\u{FF0D}', '-'),
    ('\u{3000}', ' '),
];

static VERSION_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[(][^\])]*\b(live|remix|acoustic|instrumental|off[- ]?vocal|demo|edit|version|remaster(?:ed)?|mono|stereo|deluxe|bonus|karaoke|\d+kbps|\d+k)\b[^\])]*[\])]")
        .unwrap()
});
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MIDDLE_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[·・]").unwrap());

fn unify_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| FULLWIDTH_MAP.iter().find(|(f, _)| *f == c).map(|(_, h)| *h).unwrap_or(c))
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").to_string()
}

/// Normalize a title: fullwidth->halfwidth, strip version/mix/size tag
/// groups, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let unified = unify_fullwidth(title);
    let stripped = VERSION_TAGS.replace_all(&unified, "");
    collapse_whitespace(&stripped).to_lowercase()
}

/// Normalize an artist name: fullwidth->halfwidth, lowercase, unify
/// middle-dot variants.
pub fn normalize_artist(artist: &str) -> String {
    let unified = unify_fullwidth(artist);
    let unified = MIDDLE_DOT.replace_all(&unified, "/");
    collapse_whitespace(&unified).to_lowercase()
}

/// Ratcliff/Obershelp-style similarity ratio (as `difflib.SequenceMatcher`
/// computes it), ignoring `' '` as a junk character, over chars.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|&c| c != ' ').collect();
    let b: Vec<char> = b.chars().filter(|&c| c != ' ').collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matches = matching_blocks_length(&a, &b);
    (2.0 * matches as f64) / (a.len() + b.len()) as f64
}

fn matching_blocks_length(a: &[char], b: &[char]) -> usize {
    fn recurse(a: &[char], b: &[char]) -> usize {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let (mut best_len, mut best_a, mut best_b) = (0usize, 0usize, 0usize);
        let mut j_for_prefix_len: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        for i in 0..a.len() {
            let mut new_counts: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
            for j in 0..b.len() {
                if a[i] == b[j] {
                    let prev = if j > 0 { *j_for_prefix_len.get(&(j - 1)).unwrap_or(&0) } else { 0 };
                    let cur = prev + 1;
                    new_counts.insert(j, cur);
                    if cur > best_len {
                        best_len = cur;
                        best_a = i + 1 - cur;
                        best_b = j + 1 - cur;
                    }
                }
            }
            j_for_prefix_len = new_counts;
        }
        if best_len == 0 {
            return 0;
        }
        best_len
            + recurse(&a[..best_a], &b[..best_b])
            + recurse(&a[best_a + best_len..], &b[best_b + best_len..])
    }
    recurse(a, b)
}

/// Composite score per spec §4.E: 0.55 title + 0.45 artist when both
/// present, else title alone; a sub-30 title score applies a 35-point
/// penalty, clamped at 0.
pub fn score_candidate(
    query_title: &str,
    query_artist: Option<&str>,
    cand_title: &str,
    cand_artist: Option<&str>,
) -> f64 {
    let title_score = similarity_ratio(&normalize_title(query_title), &normalize_title(cand_title)) * 100.0;

    let score = match (query_artist, cand_artist) {
        (Some(qa), Some(ca)) if !qa.is_empty() && !ca.is_empty() => {
            let artist_score = similarity_ratio(&normalize_artist(qa), &normalize_artist(ca)) * 100.0;
            0.55 * title_score + 0.45 * artist_score
        }
        _ => title_score,
    };

    if title_score < 30.0 {
        (score - 35.0).max(0.0)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity_ratio("hello", "hello"), 1.0);
    }

    #[test]
    fn spaces_are_ignored_as_junk() {
        assert_eq!(similarity_ratio("hello world", "helloworld"), 1.0);
    }

    #[test]
    fn completely_different_strings_score_low() {
        assert!(similarity_ratio("abc", "xyz") < 0.2);
    }

    #[test]
    fn title_and_artist_composite_weighting() {
        let score = score_candidate("Song", Some("Artist"), "Song", Some("Artist"));
        assert!(score > 99.0);
    }

    #[test]
    fn low_title_score_applies_penalty() {
        let with_penalty = score_candidate("completely different", Some("x"), "totally unrelated", Some("x"));
        assert!(with_penalty >= 0.0);
    }

    #[test]
    fn normalize_title_strips_version_tags() {
        let n = normalize_title("Song Title (Remastered 2020)");
        assert!(!n.contains("remaster"));
    }
}
