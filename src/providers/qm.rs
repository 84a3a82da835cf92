//! QM (Tencent/QQ Music): session-bootstrapped JSON-RPC-style API with
//! QRC-ciphered lyric payloads.

use std::sync::Mutex;

use base64::Engine;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cipher::qrc_decrypt_hex;
use crate::error::{FetchError, Result};
use crate::model::{Artist, LyricsBundle, Song, Source};
use crate::parsers::lrc::parse_lrc;
use crate::parsers::plaintext::parse_plaintext;
use crate::parsers::qrc::parse_qrc;

use super::QM_CLIENT;

const ENDPOINT: &str = "https://u.y.qq.com/cgi-bin/musicu.fcg";

#[derive(Clone, Default)]
struct Session {
    uid: String,
    sid: String,
    userip: String,
}

static SESSION: Lazy<Mutex<Option<Session>>> = Lazy::new(|| Mutex::new(None));
static BOOTSTRAP_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

async fn ensure_session() -> Result<Session> {
    if let Some(s) = SESSION.lock().expect("qm session poisoned").clone() {
        return Ok(s);
    }
    let _guard = BOOTSTRAP_LOCK.lock().await;
    if let Some(s) = SESSION.lock().expect("qm session poisoned").clone() {
        return Ok(s);
    }
    tracing::debug!("qm: bootstrapping session");

    let body = json!({
        "comm": { "cv": 0, "ct": 24, "format": "json" },
        "req": {
            "method": "GetUserInfo",
            "module": "music.getSession.session",
            "param": {},
        }
    });
    let resp = QM_CLIENT
        .post(ENDPOINT)
        .json(&body)
        .send()
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "qm: session bootstrap request failed"))?;
    let v: Value = resp.json().await?;
    let req = &v["req"]["data"];
    let session = Session {
        uid: req["uid"].as_str().unwrap_or_default().to_string(),
        sid: req["sid"].as_str().unwrap_or_default().to_string(),
        userip: req["userip"].as_str().unwrap_or_default().to_string(),
    };
    if session.sid.is_empty() {
        tracing::warn!("qm: session bootstrap returned no sid");
    } else {
        tracing::debug!("qm: session bootstrap succeeded");
    }
    *SESSION.lock().expect("qm session poisoned") = Some(session.clone());
    Ok(session)
}

fn comm_block(session: &Session) -> Value {
    json!({
        "cv": 0, "ct": 24, "format": "json",
        "uid": session.uid, "sid": session.sid, "userip": session.userip,
    })
}

#[derive(Deserialize, Default)]
struct SearchSong {
    id: Option<i64>,
    title: Option<String>,
    singer: Option<Vec<SearchSinger>>,
    album: Option<SearchAlbum>,
    interval: Option<i64>,
}

#[derive(Deserialize, Default)]
struct SearchSinger {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct SearchAlbum {
    name: Option<String>,
}

/// Search via `music.search.SearchCgiService`'s `DoSearchForQQMusicLite`.
pub async fn search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    let session = ensure_session().await.unwrap_or_default();
    let body = json!({
        "comm": comm_block(&session),
        "req": {
            "method": "DoSearchForQQMusicLite",
            "module": "music.search.SearchCgiService",
            "param": {
                "query": keyword,
                "num_per_page": 20,
                "page_num": page,
                "search_type": 0,
            },
        }
    });
    let resp = QM_CLIENT.post(ENDPOINT).json(&body).send().await?;
    let v: Value = resp.json().await?;
    let songs: Vec<SearchSong> = serde_json::from_value(
        v["req"]["data"]["body"]["item_song"].clone(),
    )
    .unwrap_or_default();

    Ok(songs
        .into_iter()
        .map(|s| Song {
            source: Some(Source::Qm),
            id: s.id.map(|i| i.to_string()),
            title: s.title,
            artist: Some(Artist::new(
                s.singer
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|si| si.name),
            )),
            album: s.album.and_then(|a| a.name),
            duration_ms: s.interval.map(|i| i * 1000),
            extra: Default::default(),
        })
        .collect())
}

/// Resolve the ciphertext and `_t` gating flag for one of the three lyric
/// tracks out of a flat `GetPlayLyricInfo` response. `orig` prefers
/// `qrc_t`, falling back to `lrc_t` only when `qrc_t` is numeric `0`; `ts`
/// and `roma` each read their own `{field}_t`. A track is skipped when its
/// ciphertext is empty, or its flag is the *string* `"0"` (kept literal,
/// not normalized to a numeric comparison — the API inconsistently sends
/// both).
fn decode_field(resp: &Value, field: &str) -> Option<String> {
    let encrypted = resp[field].as_str().filter(|s| !s.is_empty())?;
    let flag = if field == "lyric" {
        if resp["qrc_t"] == 0 {
            &resp["lrc_t"]
        } else {
            &resp["qrc_t"]
        }
    } else {
        &resp[format!("{field}_t")]
    };
    if flag.as_str() == Some("0") {
        return None;
    }
    Some(encrypted.to_string())
}

fn decrypt_and_parse(hex_cipher: &str) -> Option<crate::model::LyricsData> {
    let plain = qrc_decrypt_hex(hex_cipher).ok()?;
    if let Ok((_, data)) = parse_qrc(&plain) {
        if !data.is_empty() {
            return Some(data);
        }
    }
    let (_, data) = parse_lrc(&plain);
    if !data.is_empty() {
        return Some(data);
    }
    let data = parse_plaintext(&plain);
    if !data.is_empty() {
        Some(data)
    } else {
        None
    }
}

/// `music.musichallSong.PlayLyricInfo` — lyric/trans/roma ciphertext and
/// their gating flags are flat top-level keys on the response (`lyric`,
/// `trans`, `roma`; `qrc_t`/`lrc_t`, `trans_t`, `roma_t`), not nested under
/// per-field objects. `id`/`title`/`album`/`duration_ms` are all required,
/// matching QM's own parameter validation.
pub async fn get_lyrics(song: &Song) -> Result<LyricsBundle> {
    let id = song
        .id
        .as_deref()
        .ok_or_else(|| FetchError::Params("QM requires a song id".into()))?;
    if song.title.is_none() || song.album.is_none() || song.duration_ms.is_none() {
        return Err(FetchError::Params(
            "QM requires id/title/album/duration_ms".into(),
        ));
    }
    let session = ensure_session().await.unwrap_or_default();

    let b64 = |s: &Option<String>| {
        base64::engine::general_purpose::STANDARD.encode(s.clone().unwrap_or_default())
    };

    let body = json!({
        "comm": comm_block(&session),
        "req": {
            "method": "GetPlayLyricInfo",
            "module": "music.musichallSong.PlayLyricInfo",
            "param": {
                "songMID": id,
                "songName": b64(&song.title),
                "albumName": b64(&song.album),
                "singerName": b64(&song.artist.as_ref().map(Artist::join)),
                "qrc": 1, "trans": 1, "roma": 1,
                "qrc_t": 0, "lrc_t": 0, "trans_t": 0, "roma_t": 0,
            },
        }
    });
    let resp = QM_CLIENT.post(ENDPOINT).json(&body).send().await?;
    let v: Value = resp.json().await?;
    let data = &v["req"]["data"];

    let mut bundle = LyricsBundle {
        song: song.clone(),
        ..Default::default()
    };

    if let Some(hex) = decode_field(data, "lyric") {
        bundle.orig = decrypt_and_parse(&hex);
    }
    if let Some(hex) = decode_field(data, "trans") {
        bundle.ts = decrypt_and_parse(&hex);
    }
    if let Some(hex) = decode_field(data, "roma") {
        bundle.roma = decrypt_and_parse(&hex);
    }

    // Only fall back to synthetic tags when nothing real was decoded.
    if bundle.tags.is_empty() {
        bundle.tags.insert("ti".into(), song.title.clone().unwrap_or_default());
        bundle.tags.insert(
            "ar".into(),
            song.artist.as_ref().map(Artist::join).unwrap_or_default(),
        );
        bundle.tags.insert("al".into(), song.album.clone().unwrap_or_default());
        bundle.tags.insert("tool".into(), "lddc-fetch-core".into());
    }

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_flag_skip_requires_literal_string_zero() {
        let resp = json!({"trans": "deadbeef", "trans_t": 0});
        assert_eq!(decode_field(&resp, "trans"), Some("deadbeef".to_string()));
        let resp = json!({"trans": "deadbeef", "trans_t": "0"});
        assert_eq!(decode_field(&resp, "trans"), None);
    }

    #[test]
    fn orig_flag_prefers_qrc_t_and_falls_back_to_lrc_t() {
        let resp = json!({"lyric": "deadbeef", "qrc_t": "0", "lrc_t": 1});
        assert_eq!(decode_field(&resp, "lyric"), Some("deadbeef".to_string()));
        let resp = json!({"lyric": "deadbeef", "qrc_t": 0, "lrc_t": "0"});
        assert_eq!(decode_field(&resp, "lyric"), None);
    }

    #[test]
    fn decode_field_skips_empty_ciphertext() {
        let resp = json!({"roma": "", "roma_t": 1});
        assert_eq!(decode_field(&resp, "roma"), None);
    }
}
