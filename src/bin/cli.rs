use std::process::ExitCode;

use clap::Parser;
use lddc_fetch_core::fetch::{fetch, FetchRequest};
use lddc_fetch_core::model::{Mode, Source, Translation};
use lddc_fetch_core::render::{render_lrc, RenderOptions};
use lddc_fetch_core::translate::TranslateConfig;

/// Fetch, pick, and render a synced lyric for a title/artist query.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Track title to search for.
    #[arg(long)]
    title: String,
    /// Track artist (improves ranking and enables artist-qualified keywords).
    #[arg(long)]
    artist: Option<String>,
    /// Output mode: line, verbatim, or enhanced.
    #[arg(long, value_enum, default_value = "line")]
    mode: ModeArg,
    /// Translation behavior: none, provider, openai, or auto.
    #[arg(long, value_enum, default_value = "none")]
    translation: TranslationArg,
    /// Offset in milliseconds applied to every timestamp, clamped at 0.
    #[arg(long, default_value_t = 0)]
    offset_ms: i64,
    /// Timestamp fraction digits: 2 for centiseconds, 3 for milliseconds.
    #[arg(long, default_value_t = 3)]
    ms_digits: u8,
    /// Comma-separated provider list, in priority order (default: all four).
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,
    /// OpenAI-compatible chat-completion base URL, for --translation openai/auto.
    #[arg(long)]
    openai_base_url: Option<String>,
    /// API key for the translation endpoint.
    #[arg(long)]
    openai_api_key: Option<String>,
    /// Model name for the translation endpoint.
    #[arg(long)]
    openai_model: Option<String>,
    /// Target language for translation (default: English).
    #[arg(long)]
    target_language: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Line,
    Verbatim,
    Enhanced,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Line => Mode::Line,
            ModeArg::Verbatim => Mode::Verbatim,
            ModeArg::Enhanced => Mode::Enhanced,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TranslationArg {
    None,
    Provider,
    Openai,
    Auto,
}

impl From<TranslationArg> for Translation {
    fn from(t: TranslationArg) -> Self {
        match t {
            TranslationArg::None => Translation::None,
            TranslationArg::Provider => Translation::Provider,
            TranslationArg::Openai => Translation::Openai,
            TranslationArg::Auto => Translation::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let sources = if args.sources.is_empty() {
        vec![Source::Lrclib, Source::Qm, Source::Kg, Source::Ne]
    } else {
        match args
            .sources
            .iter()
            .map(|s| Source::parse(s).ok_or_else(|| s.clone()))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(sources) => sources,
            Err(bad) => {
                eprintln!("unknown source: {bad}");
                return ExitCode::from(2);
            }
        }
    };

    let translation: Translation = args.translation.into();
    let translate_config = if translation != Translation::None {
        Some(TranslateConfig {
            base_url: args.openai_base_url.clone().unwrap_or_default(),
            api_key: args.openai_api_key.clone().unwrap_or_default(),
            model: args.openai_model.clone().unwrap_or_default(),
            target_language: args.target_language.clone().unwrap_or_else(|| "English".to_string()),
            ..Default::default()
        })
    } else {
        None
    };

    let req = FetchRequest {
        title: args.title.clone(),
        artist: args.artist.clone(),
        sources,
        translation,
        translate_config,
        ..Default::default()
    };

    let bundle = match fetch(&req).await {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let Some(orig) = &bundle.orig else {
        eprintln!("not found: no lyrics for query");
        return ExitCode::from(2);
    };

    let opts = RenderOptions {
        mode: args.mode.into(),
        offset_ms: args.offset_ms,
        ms_digits: args.ms_digits,
        include_translation: translation != Translation::None,
        end_timestamp: false,
    };

    println!("{}", render_lrc(&bundle.tags, orig, bundle.ts.as_ref(), &opts));
    ExitCode::SUCCESS
}
