use anyhow::Result;
use axum::Router;
use boolsearch_core::{AnalyzerConfig, Language};
use clap::{Parser, ValueEnum};
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    Russian,
    English,
}

#[derive(Parser)]
struct Args {
    /// Index file path
    #[arg(long, default_value = "./index.bin")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Stemming language applied to query operands; must match the build
    #[arg(long, value_enum, default_value_t = Lang::Russian)]
    language: Lang,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let language = match args.language {
        Lang::Russian => Language::Russian,
        Lang::English => Language::English,
    };
    let app: Router = build_app(&args.index, AnalyzerConfig { language, ..AnalyzerConfig::default() })?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
