//! Translation client (component K): a line-numbered prompt to an external
//! chat-completion endpoint, memoized in the shared TTL cache.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::json;

use crate::cache::TtlCache;
use crate::error::{FetchError, Result};

const PROMPT_PREFIX: &str = "Translate the following numbered lyric lines into {target}. \
Reply with the same numbering, one translated line per input line, nothing else:\n\n";

static TRANSLATION_CACHE: Lazy<TtlCache<String, Arc<Vec<String>>>> = Lazy::new(TtlCache::new);

#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub target_language: String,
    pub timeout: Duration,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        TranslateConfig {
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            target_language: "English".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

fn cache_key(lines: &[String], cfg: &TranslateConfig) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    lines.hash(&mut hasher);
    cfg.target_language.hash(&mut hasher);
    cfg.base_url.hash(&mut hasher);
    cfg.model.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Translate `lines` (in order) via `cfg`, consulting the 4-hour TTL
/// memoization cache first.
pub async fn translate_lines(lines: &[String], cfg: &TranslateConfig) -> Result<Vec<String>> {
    let key = cache_key(lines, cfg);
    if let Some(cached) = TRANSLATION_CACHE.get(&key) {
        return Ok((*cached).clone());
    }

    let mut prompt = PROMPT_PREFIX.replace("{target}", &cfg.target_language);
    for (i, line) in lines.iter().enumerate() {
        prompt.push_str(&format!("{:02}|{}\n", i + 1, line));
    }

    let client = reqwest::Client::builder()
        .timeout(cfg.timeout)
        .build()
        .map_err(|e| FetchError::Translate(format!("client build: {e}")))?;

    let body = json!({
        "model": cfg.model,
        "messages": [{ "role": "user", "content": prompt }],
    });

    let resp = client
        .post(format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')))
        .bearer_auth(&cfg.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| FetchError::Translate(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(FetchError::Translate(format!(
            "translator returned status {}",
            resp.status()
        )));
    }

    let v: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| FetchError::Translate(e.to_string()))?;
    let content = v["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| FetchError::Translate("missing choices[0].message.content".into()))?;

    let translated = parse_numbered_response(content)?;
    if translated.len() != lines.len() {
        return Err(FetchError::Translate(format!(
            "translator returned {} lines, expected {}",
            translated.len(),
            lines.len()
        )));
    }

    TRANSLATION_CACHE.set(key, Arc::new(translated.clone()), Duration::from_secs(4 * 3600));
    Ok(translated)
}

/// Parse a (possibly triple-backtick-fenced) numbered response: each line
/// is split once on `|`, taking the right side.
fn parse_numbered_response(content: &str) -> Result<Vec<String>> {
    let unfenced = content.trim();
    let unfenced = unfenced
        .strip_prefix("```")
        .map(|s| s.trim_start_matches(|c: char| c != '\n').trim_start_matches('\n'))
        .unwrap_or(unfenced);
    let unfenced = unfenced.trim_end().strip_suffix("```").unwrap_or(unfenced);

    let mut out = Vec::new();
    for line in unfenced.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match line.splitn(2, '|').nth(1) {
            Some(rest) => out.push(rest.to_string()),
            None => out.push(line.to_string()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbered_lines() {
        let out = parse_numbered_response("01|hello\n02|world\n").unwrap();
        assert_eq!(out, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn strips_triple_backtick_fence() {
        let out = parse_numbered_response("```\n01|a\n02|b\n```").unwrap();
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);
    }
}
