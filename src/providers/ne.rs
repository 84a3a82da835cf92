//! NE (NetEase): EAPI-encrypted envelope for both request params and
//! response bodies, anonymous session bootstrap, and tolerance for five
//! historical search response shapes.

use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;
use rand::RngCore;
use serde_json::{json, Value};

use crate::cache::TtlCache;
use crate::cipher::eapi::{anonymous_username, eapi_params_encrypt, eapi_response_decrypt};
use crate::error::{FetchError, Result};
use crate::model::{Artist, LyricsBundle, Song, Source};
use crate::parsers::lrc::parse_lrc;
use crate::parsers::yrc::parse_yrc;

use super::NE_CLIENT;

const BASE: &str = "https://interface.music.163.com";

#[derive(Clone, Default)]
struct NeSession {
    cookie: String,
}

static SESSION_CACHE: Lazy<TtlCache<&'static str, NeSession>> = Lazy::new(TtlCache::new);
static BOOTSTRAP_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));
static DEVICE_ID: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

fn device_id() -> String {
    let mut guard = DEVICE_ID.lock().expect("device id poisoned");
    if let Some(id) = guard.as_ref() {
        return id.clone();
    }
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    let id = hex::encode(bytes);
    *guard = Some(id.clone());
    id
}

async fn ensure_session() -> Result<NeSession> {
    if let Some(s) = SESSION_CACHE.get(&"ne_session") {
        return Ok(s);
    }
    let _guard = BOOTSTRAP_LOCK.lock().await;
    if let Some(s) = SESSION_CACHE.get(&"ne_session") {
        return Ok(s);
    }
    tracing::debug!("ne: bootstrapping anonymous session");

    let device = device_id();
    let username = anonymous_username(&device);
    let params = json!({ "username": username }).to_string();
    let hex_body = eapi_params_encrypt("/api/register/anonimous", &params)?;

    let resp = NE_CLIENT
        .post(format!("{BASE}/eapi/register/anonimous"))
        .form(&[("params", hex_body)])
        .send()
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "ne: session bootstrap request failed"))?;

    let cookie = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|c| {
            c.starts_with("NMTID") || c.starts_with("MUSIC_A") || c.starts_with("__csrf")
        })
        .map(|c| c.split(';').next().unwrap_or(c).to_string())
        .collect::<Vec<_>>()
        .join("; ");

    if cookie.is_empty() {
        tracing::warn!("ne: session bootstrap returned no session cookies");
    } else {
        tracing::debug!("ne: session bootstrap succeeded");
    }
    let session = NeSession { cookie };
    SESSION_CACHE.set("ne_session", session.clone(), Duration::from_secs(10 * 24 * 3600));
    Ok(session)
}

async fn eapi_request(path: &str, params: Value) -> Result<Value> {
    let session = ensure_session().await.unwrap_or_default();
    let params_str = params.to_string();
    let hex_body = eapi_params_encrypt(path, &params_str)?;
    let resp = NE_CLIENT
        .post(format!("{BASE}/eapi{path}"))
        .header(reqwest::header::COOKIE, session.cookie)
        .form(&[("params", hex_body)])
        .send()
        .await?;
    let raw = resp.bytes().await?;
    let plain = eapi_response_decrypt(&raw)?;
    serde_json::from_slice(&plain).map_err(|e| FetchError::Processing(format!("NE response json: {e}")))
}

fn extract_songs(v: &Value) -> Vec<Value> {
    // Five historical shapes, tried in order; unknown shapes fall through
    // to an empty list rather than raising.
    if let Some(arr) = v["data"]["resources"].as_array() {
        let via_base_info: Vec<Value> = arr
            .iter()
            .filter_map(|r| r["baseInfo"]["simpleSongData"].as_object())
            .map(|o| Value::Object(o.clone()))
            .collect();
        if !via_base_info.is_empty() {
            return via_base_info;
        }
        if !arr.is_empty() {
            return arr.clone();
        }
    }
    if let Some(arr) = v["result"]["songs"].as_array() {
        return arr.clone();
    }
    if let Some(arr) = v["data"]["songs"].as_array() {
        return arr.clone();
    }
    if let Some(arr) = v["data"]["songs"]["songs"].as_array() {
        return arr.clone();
    }
    Vec::new()
}

fn to_song(v: &Value) -> Song {
    let artists = v["artists"]
        .as_array()
        .or_else(|| v["ar"].as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a["name"].as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let album = v["album"]["name"]
        .as_str()
        .or_else(|| v["al"]["name"].as_str())
        .map(str::to_string);
    let duration_ms = v["duration"].as_i64().or_else(|| v["dt"].as_i64());

    Song {
        source: Some(Source::Ne),
        id: v["id"].as_u64().map(|i| i.to_string()),
        title: v["name"].as_str().map(str::to_string),
        artist: Some(Artist::new(artists)),
        album,
        duration_ms,
        extra: Default::default(),
    }
}

pub async fn search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    let v = eapi_request(
        "/search/song/list/page",
        json!({ "s": keyword, "offset": (page.saturating_sub(1)) * 20, "limit": 20, "type": 1 }),
    )
    .await?;
    Ok(extract_songs(&v).iter().map(to_song).collect())
}

/// `/song/lyric/v1` — prefers `yrc.lyric` (YRC, untimed-word absolute
/// grammar) over `lrc.lyric` (LRC, NE repeated-timestamp dialect).
/// Translation/romanization are always LRC in the NE dialect.
pub async fn get_lyrics(song: &Song) -> Result<LyricsBundle> {
    let id: i64 = song
        .id
        .as_deref()
        .ok_or_else(|| FetchError::Params("NE requires a song id".into()))?
        .parse()
        .map_err(|_| FetchError::Params("NE song id is not numeric".into()))?;

    let v = eapi_request(
        "/song/lyric/v1",
        json!({ "id": id, "lv": -1, "tv": -1, "rv": -1, "yv": -1 }),
    )
    .await?;

    let mut bundle = LyricsBundle {
        song: song.clone(),
        ..Default::default()
    };

    if let Some(yrc) = v["yrc"]["lyric"].as_str().filter(|s| !s.is_empty()) {
        let (tags, data) = parse_yrc(yrc);
        bundle.tags = tags;
        bundle.orig = Some(data);
    } else if let Some(lrc) = v["lrc"]["lyric"].as_str().filter(|s| !s.is_empty()) {
        let (tags, data) = parse_lrc(lrc);
        bundle.tags = tags;
        bundle.orig = Some(data);
    }

    if let Some(tlyric) = v["tlyric"]["lyric"].as_str().filter(|s| !s.is_empty()) {
        let (_, data) = parse_lrc(tlyric);
        bundle.ts = Some(data);
    }
    if let Some(roma) = v["romalrc"]["lyric"].as_str().filter(|s| !s.is_empty()) {
        let (_, data) = parse_lrc(roma);
        bundle.roma = Some(data);
    }

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_songs_from_resources_shape() {
        let v = json!({ "data": { "resources": [ { "baseInfo": { "simpleSongData": { "id": 1, "name": "a" } } } ] } });
        let songs = extract_songs(&v);
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0]["name"], "a");
    }

    #[test]
    fn extracts_songs_from_result_songs_shape() {
        let v = json!({ "result": { "songs": [ { "id": 1, "name": "a" } ] } });
        assert_eq!(extract_songs(&v).len(), 1);
    }

    #[test]
    fn unknown_shape_falls_through_to_empty() {
        let v = json!({ "something": "else" });
        assert!(extract_songs(&v).is_empty());
    }
}
