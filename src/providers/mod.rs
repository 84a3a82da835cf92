//! Providers (component G): one module per source, each exposing plain
//! `search`/`get_lyrics` async functions against a shared, provider-scoped
//! `reqwest::Client`. The coordinator (component H) dispatches to these by
//! matching on [`crate::model::Source`] rather than through a trait object,
//! mirroring the teacher's flat per-provider module layout.

pub mod kg;
pub mod lrclib;
pub mod ne;
pub mod qm;

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("lddc-fetch-core/0.1")
        .timeout(timeout)
        .build()
        .expect("failed to build HTTP client")
}

pub(crate) static LRCLIB_CLIENT: Lazy<Client> = Lazy::new(|| build_client(Duration::from_secs(30)));
pub(crate) static QM_CLIENT: Lazy<Client> = Lazy::new(|| build_client(Duration::from_secs(15)));
pub(crate) static KG_CLIENT: Lazy<Client> = Lazy::new(|| build_client(Duration::from_secs(15)));
pub(crate) static KG_LEGACY_CLIENT: Lazy<Client> = Lazy::new(|| build_client(Duration::from_secs(3)));
pub(crate) static NE_CLIENT: Lazy<Client> = Lazy::new(|| build_client(Duration::from_secs(15)));
