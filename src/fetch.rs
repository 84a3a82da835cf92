//! Fetch coordinator (component H): keyword variant generation, per-source
//! search with score filtering and dedup, top-K candidate fetch, best-bundle
//! ranking, and optional translation.

use std::collections::HashSet;

use crate::error::{FetchError, Result};
use crate::model::{LyricsBundle, LyricsData, LyricsLine, LyricsWord, Song, Source, Translation};
use crate::providers::{kg, lrclib, ne, qm};
use crate::score::score_candidate;
use crate::translate::{translate_lines, TranslateConfig};

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub title: String,
    pub artist: Option<String>,
    pub sources: Vec<Source>,
    pub min_score: f64,
    pub max_candidates: usize,
    pub translation: Translation,
    pub translate_config: Option<TranslateConfig>,
}

impl Default for FetchRequest {
    fn default() -> Self {
        FetchRequest {
            title: String::new(),
            artist: None,
            sources: vec![Source::Lrclib, Source::Qm, Source::Kg, Source::Ne],
            min_score: 55.0,
            max_candidates: 8,
            translation: Translation::None,
            translate_config: None,
        }
    }
}

fn keyword_variants(title: &str, artist: Option<&str>) -> Vec<String> {
    match artist {
        Some(a) if !a.is_empty() => vec![
            format!("{a} - {title}"),
            format!("{a} {title}"),
            title.to_string(),
        ],
        _ => vec![title.to_string()],
    }
}

pub(crate) async fn search_source(source: Source, keyword: &str) -> Result<Vec<Song>> {
    match source {
        Source::Lrclib => lrclib::search(keyword, 1).await,
        Source::Qm => qm::search(keyword, 1).await,
        Source::Kg => kg::search(keyword, 1).await,
        Source::Ne => ne::search(keyword, 1).await,
    }
}

pub(crate) async fn fetch_source(source: Source, song: &Song) -> Result<LyricsBundle> {
    match source {
        Source::Lrclib => lrclib::get_lyrics(song).await,
        Source::Qm => qm::get_lyrics(song).await,
        Source::Kg => kg::get_lyrics(song).await,
        Source::Ne => ne::get_lyrics(song).await,
    }
}

fn source_priority(order: &[Source], source: Source) -> usize {
    order.iter().position(|&s| s == source).unwrap_or(order.len())
}

/// Try each keyword variant in turn, searching every requested source for
/// that variant before deciding whether to advance. Stops globally at the
/// first keyword variant that yields any candidate at or above `min_score`
/// from *any* source — sources never advance through keyword variants
/// independently of one another. Candidates are deduped by fingerprint
/// within that variant's combined results.
async fn candidates_for_sources(
    sources: &[Source],
    keywords: &[String],
    query_title: &str,
    query_artist: Option<&str>,
    min_score: f64,
) -> Vec<(f64, Source, Song)> {
    for keyword in keywords {
        let mut seen = HashSet::new();
        let mut scored = Vec::new();
        for &source in sources {
            let rows = match search_source(source, keyword).await {
                Ok(rows) => rows,
                Err(_) => continue,
            };
            for song in rows {
                if !seen.insert(song.fingerprint()) {
                    continue;
                }
                let cand_title = song.title.clone().unwrap_or_default();
                let cand_artist = song.artist.as_ref().map(|a| a.join());
                let score = score_candidate(
                    query_title,
                    query_artist,
                    &cand_title,
                    cand_artist.as_deref(),
                );
                if score >= min_score {
                    scored.push((score, source, song));
                }
            }
        }
        if !scored.is_empty() {
            return scored;
        }
    }
    Vec::new()
}

/// `(score, verbatim bonus, translation bonus, source priority)`, compared
/// lexicographically with the highest tuple winning.
fn rank_key(score: f64, bundle: &LyricsBundle, source: Source, source_order: &[Source]) -> (i64, i64, i64, i64) {
    let verbatim_bonus = bundle
        .orig
        .as_ref()
        .map(|d| d.lines().iter().any(|l| l.words.len() > 1))
        .unwrap_or(false) as i64;
    let translation_bonus = bundle.ts.as_ref().map(|d| !d.is_empty()).unwrap_or(false) as i64;
    let priority_bonus = source_order.len() as i64 - source_priority(source_order, source) as i64;
    ((score * 1000.0) as i64, verbatim_bonus, translation_bonus, priority_bonus)
}

async fn translate_bundle(bundle: &mut LyricsBundle, req: &FetchRequest) -> Result<()> {
    // "provider" means: use whatever translation track the source already
    // supplied (already on `bundle.ts`), never call the translation API.
    if req.translation == Translation::None || req.translation == Translation::Provider {
        return Ok(());
    }
    let already_has_ts = bundle.ts.as_ref().map(|d| !d.is_empty()).unwrap_or(false);
    if already_has_ts {
        return Ok(());
    }
    let Some(orig) = &bundle.orig else { return Ok(()) };
    let Some(cfg) = &req.translate_config else { return Ok(()) };

    let lines: Vec<String> = orig.lines().iter().map(|l| l.text()).collect();
    match translate_lines(&lines, cfg).await {
        Ok(translated) => {
            let ts_lines: Vec<LyricsLine> = orig
                .lines()
                .iter()
                .zip(translated)
                .map(|(l, text)| LyricsLine {
                    start_ms: l.start_ms,
                    end_ms: l.end_ms,
                    words: vec![LyricsWord {
                        start_ms: l.effective_start(),
                        end_ms: l.effective_end(),
                        text,
                    }],
                })
                .collect();
            bundle.ts = Some(LyricsData(ts_lines));
            Ok(())
        }
        // "openai" is a hard request for a translation; re-raise. "auto"
        // degrades silently to whatever alignment the source already gave.
        Err(e) if req.translation == Translation::Openai => Err(e),
        Err(_) => Ok(()),
    }
}

/// Run the full pipeline: search every requested source, score and dedup
/// candidates, fetch lyrics for the top-ranked ones, pick the best bundle,
/// optionally translate, and strip placeholder artifacts.
pub async fn fetch(req: &FetchRequest) -> Result<LyricsBundle> {
    if req.title.trim().is_empty() {
        return Err(FetchError::Params("title is required".into()));
    }
    let keywords = keyword_variants(&req.title, req.artist.as_deref());

    let mut all_scored: Vec<(f64, Source, Song)> = candidates_for_sources(
        &req.sources,
        &keywords,
        &req.title,
        req.artist.as_deref(),
        req.min_score,
    )
    .await;

    all_scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    all_scored.truncate(req.max_candidates);

    if all_scored.is_empty() {
        tracing::debug!(title = %req.title, "fetch: no candidate cleared min_score");
        return Err(FetchError::NotFound("no candidate matched the query".into()));
    }
    tracing::debug!(count = all_scored.len(), "fetch: ranked candidates to try");

    let mut best: Option<((i64, i64, i64, i64), LyricsBundle)> = None;
    for (score, source, song) in &all_scored {
        let bundle = match fetch_source(*source, song).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(source = source.as_str(), error = %e, "fetch: source failed");
                continue;
            }
        };
        if bundle.orig.as_ref().map(|d| d.is_empty()).unwrap_or(true) {
            continue;
        }
        let key = rank_key(*score, &bundle, *source, &req.sources);
        let better = match &best {
            Some((best_key, _)) => key > *best_key,
            None => true,
        };
        if better {
            best = Some((key, bundle));
        }
    }

    let mut bundle = best
        .map(|(_, b)| b)
        .ok_or_else(|| FetchError::NotFound("no source returned usable lyrics".into()))?;
    tracing::debug!(
        source = bundle.song.source.map(|s| s.as_str()).unwrap_or("?"),
        "fetch: selected bundle"
    );

    translate_bundle(&mut bundle, req).await?;
    bundle.clean_placeholders();
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_variants_with_artist_in_priority_order() {
        let v = keyword_variants("Title", Some("Artist"));
        assert_eq!(v, vec!["Artist - Title", "Artist Title", "Title"]);
    }

    #[test]
    fn keyword_variants_without_artist_is_title_only() {
        assert_eq!(keyword_variants("Title", None), vec!["Title"]);
    }

    #[test]
    fn rank_key_prefers_higher_score_first() {
        let bundle = LyricsBundle::default();
        let order = [Source::Lrclib, Source::Qm];
        let low = rank_key(10.0, &bundle, Source::Lrclib, &order);
        let high = rank_key(90.0, &bundle, Source::Qm, &order);
        assert!(high > low);
    }

    #[test]
    fn rank_key_breaks_ties_by_source_priority() {
        let bundle = LyricsBundle::default();
        let order = [Source::Lrclib, Source::Qm];
        let first = rank_key(50.0, &bundle, Source::Lrclib, &order);
        let second = rank_key(50.0, &bundle, Source::Qm, &order);
        assert!(first > second);
    }
}
