use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cymatica", about = "Spectral analysis and scoring API server")]
pub struct Cli {
    /// Config file path (defaults to cymatica.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bind address override
    #[arg(long)]
    pub bind: Option<String>,

    /// Port override
    #[arg(short, long)]
    pub port: Option<u16>,
}
