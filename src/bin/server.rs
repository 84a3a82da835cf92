use clap::Parser;
use lddc_fetch_core::server::router;
use tower_http::trace::TraceLayer;

/// HTTP front end for multi-provider lyric search, fetch, and rendering.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Bind port.
    #[arg(long, default_value_t = 8765)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let app = router().layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
