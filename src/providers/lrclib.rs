//! LRCLIB: plain REST, no authentication, no bootstrap.

use serde::Deserialize;

use crate::error::{FetchError, Result};
use crate::model::{Artist, LyricsBundle, Song, Source};
use crate::parsers::{lrc::parse_lrc, plaintext::parse_plaintext};

use super::LRCLIB_CLIENT;

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct SearchRow {
    id: Option<i64>,
    trackName: Option<String>,
    artistName: Option<String>,
    albumName: Option<String>,
    duration: Option<f64>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct GetResp {
    syncedLyrics: Option<String>,
    plainLyrics: Option<String>,
}

/// `GET /search?q=keyword`, client-paginated 20 rows per page.
pub async fn search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    let url = format!(
        "https://lrclib.net/api/search?q={}",
        urlencoding::encode(keyword)
    );
    let resp = LRCLIB_CLIENT.get(&url).send().await?;
    if !resp.status().is_success() {
        return Ok(Vec::new());
    }
    let rows: Vec<SearchRow> = resp.json().await.unwrap_or_default();

    let page_size = 20usize;
    let start = (page.saturating_sub(1) as usize) * page_size;

    Ok(rows
        .into_iter()
        .skip(start)
        .take(page_size)
        .map(|r| Song {
            source: Some(Source::Lrclib),
            id: r.id.map(|i| i.to_string()),
            title: r.trackName,
            artist: r.artistName.map(Artist::single),
            album: r.albumName,
            duration_ms: r.duration.map(|d| (d * 1000.0) as i64),
            extra: Default::default(),
        })
        .collect())
}

/// `GET /get?track_name=&artist_name=&album_name=&duration=` — all four are
/// required; missing any is a parameter error.
pub async fn get_lyrics(song: &Song) -> Result<LyricsBundle> {
    let title = song
        .title
        .as_deref()
        .ok_or_else(|| FetchError::Params("LRCLIB requires title".into()))?;
    let artist = song
        .artist
        .as_ref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| FetchError::Params("LRCLIB requires artist".into()))?;
    let album = song
        .album
        .as_deref()
        .ok_or_else(|| FetchError::Params("LRCLIB requires album".into()))?;
    let duration_ms = song
        .duration_ms
        .ok_or_else(|| FetchError::Params("LRCLIB requires duration".into()))?;

    let url = format!(
        "https://lrclib.net/api/get?track_name={}&artist_name={}&album_name={}&duration={}",
        urlencoding::encode(title),
        urlencoding::encode(&artist.join()),
        urlencoding::encode(album),
        duration_ms / 1000,
    );
    let resp = LRCLIB_CLIENT.get(&url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Request(format!(
            "lrclib: unexpected status {}",
            resp.status()
        )));
    }
    let body: GetResp = resp.json().await?;

    let mut bundle = LyricsBundle {
        song: song.clone(),
        ..Default::default()
    };

    if let Some(synced) = body.syncedLyrics.filter(|s| !s.is_empty()) {
        let (tags, data) = parse_lrc(&synced);
        bundle.tags = tags;
        bundle.orig = Some(data);
    } else if let Some(plain) = body.plainLyrics.filter(|s| !s.is_empty()) {
        bundle.orig = Some(parse_plaintext(&plain));
    }

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_lyrics_requires_all_four_fields() {
        let song = Song {
            title: Some("t".into()),
            ..Default::default()
        };
        assert!(get_lyrics(&song).await.is_err());
    }
}
