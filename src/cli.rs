use clap::{Parser, ValueEnum};
use hnsample_pipeline::SAMPLE_LIMIT;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hnsample", version)]
#[command(about = "Show a random sample of Hacker News top stories, with their authors' karma", long_about = None)]
pub struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Number of stories to sample (at most the built-in limit)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub limit: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
impl Cli {
    /// Requested sample size, capped at [`SAMPLE_LIMIT`].
    pub fn sample_size(&self) -> usize {
        self.limit.map_or(SAMPLE_LIMIT, |n| usize::from(n).min(SAMPLE_LIMIT))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}
