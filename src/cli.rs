use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "YouTube video summarizer API",
    version
)]
pub struct Cli {
    /// Address to listen on [default: 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [default: 5000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log request details at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
