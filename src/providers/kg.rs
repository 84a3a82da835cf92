//! KG (Kugou): MD5-signed requests, anonymous `dfid` bootstrap, legacy
//! search fallback, and KRC-ciphered lyric payloads.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;

use crate::cache::TtlCache;
use crate::cipher::krc_xor::krc_decrypt;
use crate::error::{FetchError, Result};
use crate::model::{Artist, LyricsBundle, Song, Source};
use crate::parsers::krc::parse_krc;
use crate::parsers::plaintext::parse_plaintext;

use super::{KG_CLIENT, KG_LEGACY_CLIENT};

const OUTER_KEY: &str = "LnT6xpN3khm36zse0QzvmgTZ3waWdRSA";
const LEGACY_HOSTS: &[&str] = &[
    "mobileservice.kugou.com",
    "m.kugou.com",
    "msearch.kugou.com",
    "msearchcdn.kugou.com",
];

static DFID_CACHE: Lazy<TtlCache<&'static str, String>> = Lazy::new(TtlCache::new);

fn sign(params: &BTreeMap<&str, String>, body: &str) -> String {
    let mut s = String::from(OUTER_KEY);
    for (k, v) in params {
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s.push_str(body);
    s.push_str(OUTER_KEY);
    hex::encode(Md5::digest(s.as_bytes()))
}

async fn ensure_dfid() -> Result<String> {
    if let Some(dfid) = DFID_CACHE.get(&"dfid") {
        return Ok(dfid);
    }
    tracing::debug!("kg: bootstrapping dfid");
    let resp = KG_CLIENT
        .post("https://userservice.kugou.com/risk/v1/r_register_dev")
        .json(&serde_json::json!({}))
        .send()
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "kg: dfid bootstrap request failed"))?;
    let v: Value = resp.json().await?;
    let dfid = v["data"]["dfid"].as_str().unwrap_or("").to_string();
    if dfid.is_empty() {
        tracing::warn!("kg: dfid bootstrap returned an empty id");
    }
    DFID_CACHE.set("dfid", dfid.clone(), Duration::from_secs(1800));
    Ok(dfid)
}

#[derive(Deserialize, Default)]
struct KgSongInfo {
    hash: Option<String>,
    songname: Option<String>,
    singername: Option<String>,
    album_name: Option<String>,
    duration: Option<i64>,
}

/// `GET complexsearch.kugou.com/v2/search/song`, falling back to a
/// randomly chosen legacy mobile-search host on failure. The two paths
/// intentionally use independent signing policies, not a unified one.
pub async fn search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    match primary_search(keyword, page).await {
        Ok(rows) if !rows.is_empty() => Ok(rows),
        _ => legacy_search(keyword, page).await,
    }
}

async fn primary_search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    let dfid = ensure_dfid().await.unwrap_or_default();
    let mut params: BTreeMap<&str, String> = BTreeMap::new();
    params.insert("dfid", dfid.clone());
    params.insert("keyword", keyword.to_string());
    params.insert("page", page.to_string());
    params.insert("pagesize", "20".to_string());

    let signature = sign(&params, "");
    let url = format!(
        "http://complexsearch.kugou.com/v2/search/song?dfid={}&keyword={}&page={}&pagesize=20&signature={}",
        urlencoding::encode(&dfid),
        urlencoding::encode(keyword),
        page,
        signature,
    );
    let resp = KG_CLIENT.get(&url).send().await?;
    let v: Value = resp.json().await?;
    let rows: Vec<KgSongInfo> =
        serde_json::from_value(v["data"]["lists"].clone()).unwrap_or_default();
    Ok(rows.into_iter().map(to_song).collect())
}

async fn legacy_search(keyword: &str, page: u32) -> Result<Vec<Song>> {
    let host = LEGACY_HOSTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(LEGACY_HOSTS[0]);
    let url = format!(
        "http://{host}/mobilesearch/songsearch?keyword={}&page={}&pagesize=20",
        urlencoding::encode(keyword),
        page,
    );
    let resp = KG_LEGACY_CLIENT.get(&url).send().await?;
    let v: Value = resp.json().await?;
    let rows: Vec<KgSongInfo> =
        serde_json::from_value(v["data"]["info"].clone()).unwrap_or_default();
    Ok(rows.into_iter().map(to_song).collect())
}

fn to_song(r: KgSongInfo) -> Song {
    let mut extra = crate::model::Extra::new();
    if let Some(hash) = &r.hash {
        extra.insert("hash".to_string(), hash.clone());
    }
    Song {
        source: Some(Source::Kg),
        id: r.hash.clone(),
        title: r.songname,
        artist: r.singername.map(Artist::single),
        album: r.album_name,
        duration_ms: r.duration.map(|d| d * 1000),
        extra,
    }
}

/// `GET /v1/search` to pick a candidate's `accesskey`, then `GET /download`.
/// `contenttype == 2` means the payload is base64-encoded plaintext;
/// otherwise it is base64 -> KRC-decrypt -> parse.
pub async fn get_lyrics(song: &Song) -> Result<LyricsBundle> {
    let hash = song
        .extra
        .get("hash")
        .or(song.id.as_ref())
        .ok_or_else(|| FetchError::Params("KG requires a song hash".into()))?;
    let duration_ms = song
        .duration_ms
        .ok_or_else(|| FetchError::Params("KG requires duration_ms".into()))?;
    let title = song
        .title
        .as_deref()
        .ok_or_else(|| FetchError::Params("KG requires title".into()))?;

    let search_url = format!(
        "https://lyrics.kugou.com/v1/search?hash={}&duration={}&keyword={}",
        urlencoding::encode(hash),
        duration_ms,
        urlencoding::encode(title),
    );
    let resp = KG_CLIENT.get(&search_url).send().await?;
    let v: Value = resp.json().await?;
    let candidate = v["candidates"]
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| FetchError::NotFound("KG: no lyric candidates".into()))?;
    let accesskey = candidate["accesskey"].as_str().unwrap_or_default();
    let lyric_id = candidate["id"].as_str().unwrap_or_default();

    let download_url = format!(
        "http://lyrics.kugou.com/download?accesskey={}&id={}&fmt=krc",
        urlencoding::encode(accesskey),
        urlencoding::encode(lyric_id),
    );
    let resp = KG_CLIENT.get(&download_url).send().await?;
    let v: Value = resp.json().await?;
    let content_type = v["contenttype"].as_i64().unwrap_or(0);
    let content_b64 = v["content"].as_str().unwrap_or_default();
    let raw = base64::engine::general_purpose::STANDARD
        .decode(content_b64)
        .map_err(|e| FetchError::Decrypt(format!("KG base64: {e}")))?;

    let mut bundle = LyricsBundle {
        song: song.clone(),
        ..Default::default()
    };

    if content_type == 2 {
        let text = String::from_utf8(raw).map_err(|e| FetchError::Decrypt(e.to_string()))?;
        bundle.orig = Some(parse_plaintext(&text));
    } else {
        let decrypted = krc_decrypt(&raw)?;
        let parsed = parse_krc(&decrypted)?;
        bundle.tags = parsed.tags;
        bundle.orig = Some(parsed.orig);
        bundle.roma = parsed.roma;
        bundle.ts = parsed.ts;
    }

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_for_same_params() {
        let mut params = BTreeMap::new();
        params.insert("a", "1".to_string());
        params.insert("b", "2".to_string());
        let s1 = sign(&params, "body");
        let s2 = sign(&params, "body");
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 32);
    }

    #[test]
    fn signature_is_param_order_independent_via_btreemap() {
        let mut params_a = BTreeMap::new();
        params_a.insert("z", "9".to_string());
        params_a.insert("a", "1".to_string());
        let mut params_b = BTreeMap::new();
        params_b.insert("a", "1".to_string());
        params_b.insert("z", "9".to_string());
        assert_eq!(sign(&params_a, ""), sign(&params_b, ""));
    }
}
