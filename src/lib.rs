//! Multi-provider time-synced lyric retrieval, decryption, and LRC
//! rendering core.
//!
//! Public surface: [`model`] for the shared data types, [`fetch`] for the
//! search/score/rank coordinator, [`render`] for LRC output, and
//! [`server`] for the HTTP front end. Everything under [`providers`],
//! [`cipher`] and [`parsers`] is implementation detail kept public for
//! binary crates and tests to reach directly.

pub mod cache;
pub mod cipher;
pub mod error;
pub mod fetch;
pub mod model;
pub mod parsers;
pub mod providers;
pub mod render;
pub mod score;
pub mod server;
pub mod time;
pub mod translate;

pub use error::{FetchError, Result};
pub use model::{LyricsBundle, Mode, Song, Source, Translation};
