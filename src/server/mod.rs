//! HTTP front end (component J): `/health`, `/search`, `/fetch`,
//! `/fetch_separate`, `/fetch_by_id`, `/fetch_by_id_separate`. Enhanced
//! mode is a CLI-only feature and is rejected here with 400.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::fetch::{fetch, fetch_source, search_source, FetchRequest as CoreFetchRequest};
use crate::model::{Artist, Mode, Song, Source, Translation};
use crate::render::{render_lrc, RenderOptions};
use crate::score::score_candidate;
use crate::translate::TranslateConfig;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/fetch", post(fetch_combined))
        .route("/fetch_separate", post(fetch_separate))
        .route("/fetch_by_id", post(fetch_by_id))
        .route("/fetch_by_id_separate", post(fetch_by_id_separate))
}

async fn health() -> &'static str {
    "ok"
}

struct ApiError {
    status: StatusCode,
    kind: String,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: "Parameter".to_string(),
            message: message.into(),
        }
    }
}

impl From<FetchError> for ApiError {
    // Every uncaught fetch error surfaces as 400; 404 is reserved for
    // routes that don't exist, not for lyrics that weren't found.
    fn from(e: FetchError) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": format!("{}: {}", self.kind, self.message) });
        (self.status, Json(body)).into_response()
    }
}

fn parse_sources(raw: &Option<Vec<String>>) -> Result<Vec<Source>, ApiError> {
    match raw {
        None => Ok(vec![Source::Lrclib, Source::Qm, Source::Kg, Source::Ne]),
        Some(names) => names
            .iter()
            .map(|n| {
                Source::parse(n).ok_or_else(|| ApiError::bad_request(format!("unknown source: {n}")))
            })
            .collect(),
    }
}

fn reject_enhanced(mode: Mode) -> Result<(), ApiError> {
    if mode == Mode::Enhanced {
        return Err(ApiError::bad_request("enhanced mode is not available over HTTP"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SongDto {
    source: String,
    id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration_ms: Option<i64>,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    title: String,
    artist: Option<String>,
    sources: Option<Vec<String>>,
    limit_per_source: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SongDto>,
    errors: Vec<String>,
}

/// Keep rows with a non-null id and title, score each against the query,
/// sort desc, and apply `limit_per_source`. Pulled out of the handler so
/// the scoring/sorting/filtering rule is unit-testable without a network
/// round-trip.
fn score_sort_and_limit(
    rows: Vec<Song>,
    query_title: &str,
    query_artist: Option<&str>,
    limit: usize,
) -> Vec<SongDto> {
    let mut scored: Vec<SongDto> = rows
        .into_iter()
        .filter(|s| s.id.is_some() && s.title.is_some())
        .map(|s| {
            let cand_title = s.title.clone().unwrap_or_default();
            let cand_artist = s.artist.as_ref().map(Artist::join);
            let score = score_candidate(query_title, query_artist, &cand_title, cand_artist.as_deref());
            SongDto {
                source: s.source.map(|s| s.as_str().to_string()).unwrap_or_default(),
                id: s.id,
                title: s.title,
                artist: cand_artist,
                album: s.album,
                duration_ms: s.duration_ms,
                score,
            }
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Fan out `search` to every requested source concurrently (bounded pool =
/// #sources). Per source: keep rows with a non-null id and title, score
/// against the query, sort desc, apply `limit_per_source`. Merge and sort
/// the survivors globally desc; collect individual source failures into a
/// top-level `errors[]` instead of discarding them.
async fn search(Json(body): Json<SearchBody>) -> Result<Json<SearchResponse>, ApiError> {
    let sources = parse_sources(&body.sources)?;
    let keyword = match &body.artist {
        Some(a) if !a.is_empty() => format!("{a} - {}", body.title),
        _ => body.title.clone(),
    };
    let limit_per_source = body.limit_per_source.unwrap_or(usize::MAX);

    let futs = sources.into_iter().map(|source| {
        let keyword = keyword.clone();
        async move { (source, search_source(source, &keyword).await) }
    });
    let results = futures_util::future::join_all(futs).await;

    let mut merged: Vec<SongDto> = Vec::new();
    let mut errors = Vec::new();
    for (source, res) in results {
        match res {
            Ok(rows) => merged.extend(score_sort_and_limit(
                rows,
                &body.title,
                body.artist.as_deref(),
                limit_per_source,
            )),
            Err(e) => errors.push(format!("{}: {e}", source.as_str())),
        }
    }

    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(Json(SearchResponse { results: merged, errors }))
}

#[derive(Debug, Deserialize)]
struct FetchBody {
    title: String,
    artist: Option<String>,
    sources: Option<Vec<String>>,
    mode: Option<Mode>,
    translation: Option<Translation>,
    offset_ms: Option<i64>,
    ms_digits: Option<u8>,
    min_score: Option<f64>,
    max_candidates: Option<usize>,
    openai_base_url: Option<String>,
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    target_language: Option<String>,
}

impl FetchBody {
    fn into_core_request(&self) -> Result<CoreFetchRequest, ApiError> {
        let sources = parse_sources(&self.sources)?;
        let translation = self.translation.unwrap_or_default();
        let translate_config = if translation != Translation::None {
            Some(TranslateConfig {
                base_url: self.openai_base_url.clone().unwrap_or_default(),
                api_key: self.openai_api_key.clone().unwrap_or_default(),
                model: self.openai_model.clone().unwrap_or_default(),
                target_language: self
                    .target_language
                    .clone()
                    .unwrap_or_else(|| "English".to_string()),
                ..Default::default()
            })
        } else {
            None
        };
        Ok(CoreFetchRequest {
            title: self.title.clone(),
            artist: self.artist.clone(),
            sources,
            min_score: self.min_score.unwrap_or(55.0),
            max_candidates: self.max_candidates.unwrap_or(8),
            translation,
            translate_config,
        })
    }

    fn render_options(&self) -> Result<RenderOptions, ApiError> {
        let mode = self.mode.unwrap_or_default();
        reject_enhanced(mode)?;
        Ok(RenderOptions {
            mode,
            offset_ms: self.offset_ms.unwrap_or(0),
            ms_digits: self.ms_digits.unwrap_or(3),
            include_translation: self.translation.unwrap_or_default() != Translation::None,
            end_timestamp: false,
        })
    }
}

#[derive(Debug, Serialize)]
struct FetchResponse {
    lrc: String,
}

async fn fetch_combined(Json(body): Json<FetchBody>) -> Result<Json<FetchResponse>, ApiError> {
    let render_opts = body.render_options()?;
    let req = body.into_core_request()?;
    let bundle = fetch(&req).await?;
    let orig = bundle
        .orig
        .as_ref()
        .ok_or_else(|| ApiError::from(FetchError::NotFound("no lyrics".into())))?;
    let lrc = render_lrc(&bundle.tags, orig, bundle.ts.as_ref(), &render_opts);
    Ok(Json(FetchResponse { lrc }))
}

#[derive(Debug, Serialize)]
struct FetchSeparateResponse {
    lrc_orig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lrc_trans: Option<String>,
}

async fn fetch_separate(Json(body): Json<FetchBody>) -> Result<Json<FetchSeparateResponse>, ApiError> {
    let mut render_opts = body.render_options()?;
    render_opts.include_translation = false;
    let req = body.into_core_request()?;
    let bundle = fetch(&req).await?;
    let orig_data = bundle
        .orig
        .as_ref()
        .ok_or_else(|| ApiError::from(FetchError::NotFound("no lyrics".into())))?;
    let orig = render_lrc(&bundle.tags, orig_data, None, &render_opts);
    let ts = bundle.ts.as_ref().filter(|d| !d.is_empty()).map(|d| {
        let mut ts_opts = render_opts.clone();
        ts_opts.mode = Mode::Line;
        render_lrc(&bundle.tags, d, None, &ts_opts)
    });
    Ok(Json(FetchSeparateResponse { lrc_orig: orig, lrc_trans: ts }))
}

#[derive(Debug, Deserialize)]
struct FetchByIdBody {
    source: String,
    id: String,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration_ms: Option<i64>,
    mode: Option<Mode>,
    offset_ms: Option<i64>,
    ms_digits: Option<u8>,
}

impl FetchByIdBody {
    fn song(&self) -> Result<Song, ApiError> {
        let source = Source::parse(&self.source)
            .ok_or_else(|| ApiError::bad_request(format!("unknown source: {}", self.source)))?;
        Ok(Song {
            source: Some(source),
            id: Some(self.id.clone()),
            title: self.title.clone(),
            artist: self.artist.clone().map(Artist::single),
            album: self.album.clone(),
            duration_ms: self.duration_ms,
            extra: Default::default(),
        })
    }

    fn render_options(&self) -> Result<RenderOptions, ApiError> {
        let mode = self.mode.unwrap_or_default();
        reject_enhanced(mode)?;
        Ok(RenderOptions {
            mode,
            offset_ms: self.offset_ms.unwrap_or(0),
            ms_digits: self.ms_digits.unwrap_or(3),
            include_translation: false,
            end_timestamp: false,
        })
    }
}

async fn fetch_by_id(Json(body): Json<FetchByIdBody>) -> Result<Json<FetchResponse>, ApiError> {
    let render_opts = body.render_options()?;
    let song = body.song()?;
    let bundle = fetch_source(song.source.expect("song() always sets source"), &song).await?;
    let orig = bundle
        .orig
        .as_ref()
        .ok_or_else(|| ApiError::from(FetchError::NotFound("no lyrics".into())))?;
    let lrc = render_lrc(&bundle.tags, orig, bundle.ts.as_ref(), &render_opts);
    Ok(Json(FetchResponse { lrc }))
}

async fn fetch_by_id_separate(
    Json(body): Json<FetchByIdBody>,
) -> Result<Json<FetchSeparateResponse>, ApiError> {
    let render_opts = body.render_options()?;
    let song = body.song()?;
    let bundle = fetch_source(song.source.expect("song() always sets source"), &song).await?;
    let orig_data = bundle
        .orig
        .as_ref()
        .ok_or_else(|| ApiError::from(FetchError::NotFound("no lyrics".into())))?;
    let orig = render_lrc(&bundle.tags, orig_data, None, &render_opts);
    let ts = bundle.ts.as_ref().filter(|d| !d.is_empty()).map(|d| {
        let mut ts_opts = render_opts.clone();
        ts_opts.mode = Mode::Line;
        render_lrc(&bundle.tags, d, None, &ts_opts)
    });
    Ok(Json(FetchSeparateResponse { lrc_orig: orig, lrc_trans: ts }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhanced_mode_is_rejected_for_http_fetch() {
        let body = FetchBody {
            title: "x".into(),
            artist: None,
            sources: None,
            mode: Some(Mode::Enhanced),
            translation: None,
            offset_ms: None,
            ms_digits: None,
            min_score: None,
            max_candidates: None,
            openai_base_url: None,
            openai_api_key: None,
            openai_model: None,
            target_language: None,
        };
        assert!(body.render_options().is_err());
    }

    #[test]
    fn unknown_source_name_is_a_bad_request() {
        let result = parse_sources(&Some(vec!["bogus".to_string()]));
        assert!(result.is_err());
    }

    #[test]
    fn score_sort_and_limit_drops_rows_missing_id_or_title() {
        let rows = vec![
            Song { id: None, title: Some("has no id".into()), ..Default::default() },
            Song { id: Some("1".into()), title: None, ..Default::default() },
            Song { id: Some("2".into()), title: Some("Song".into()), ..Default::default() },
        ];
        let out = score_sort_and_limit(rows, "Song", None, usize::MAX);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, Some("2".to_string()));
    }

    #[test]
    fn score_sort_and_limit_sorts_desc_and_truncates() {
        let rows = vec![
            Song { id: Some("1".into()), title: Some("totally unrelated".into()), ..Default::default() },
            Song { id: Some("2".into()), title: Some("Song".into()), ..Default::default() },
        ];
        let out = score_sort_and_limit(rows, "Song", None, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, Some("2".to_string()));
    }

    #[test]
    fn fetch_by_id_body_builds_a_song_with_source_set() {
        let body = FetchByIdBody {
            source: "lrclib".into(),
            id: "1".into(),
            title: Some("t".into()),
            artist: None,
            album: None,
            duration_ms: None,
            mode: None,
            offset_ms: None,
            ms_digits: None,
        };
        let song = body.song().unwrap();
        assert_eq!(song.source, Some(Source::Lrclib));
    }
}
