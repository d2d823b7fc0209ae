//! Crawler configuration: CLI flags layered over an optional TOML file,
//! layered over the §6-enumerated defaults.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "crawler", about = "Polite concurrent web crawler")]
pub struct Cli {
    /// Seed file: UTF-8, one URL per line.
    #[arg(long)]
    pub seeds: PathBuf,

    /// Optional TOML config file overriding the built-in defaults below
    /// (CLI flags still take precedence over the file).
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub max_depth: Option<u32>,
    #[arg(long)]
    pub concurrent_workers: Option<usize>,
    #[arg(long)]
    pub job_queue_size: Option<usize>,
    #[arg(long)]
    pub goto_timeout_ms: Option<u64>,
    #[arg(long)]
    pub robots_timeout_ms: Option<u64>,
    #[arg(long)]
    pub requeue_threshold_secs: Option<u64>,
    #[arg(long)]
    pub jitter_min_ms: Option<u64>,
    #[arg(long)]
    pub jitter_max_ms: Option<u64>,
    #[arg(long)]
    pub evict_interval_secs: Option<u64>,
    #[arg(long)]
    pub output_root: Option<PathBuf>,
    #[arg(long)]
    pub same_origin_only: bool,
    #[arg(long)]
    pub agent_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct FileConfig {
    max_depth: Option<u32>,
    concurrent_workers: Option<usize>,
    job_queue_size: Option<usize>,
    goto_timeout_ms: Option<u64>,
    robots_timeout_ms: Option<u64>,
    requeue_threshold_secs: Option<u64>,
    jitter_min_ms: Option<u64>,
    jitter_max_ms: Option<u64>,
    evict_interval_secs: Option<u64>,
    output_root: Option<PathBuf>,
    same_origin_only: Option<bool>,
    agent_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub seeds: PathBuf,
    pub max_depth: u32,
    pub concurrent_workers: usize,
    pub job_queue_size: usize,
    pub goto_timeout: Duration,
    pub robots_timeout: Duration,
    pub requeue_threshold: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    pub evict_interval: Duration,
    pub output_root: PathBuf,
    pub same_origin_only: bool,
    pub agent_name: String,
}

impl CrawlerConfig {
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                toml::from_str(&text)?
            }
            None => FileConfig::default(),
        };

        Ok(Self {
            seeds: cli.seeds,
            max_depth: cli.max_depth.or(file.max_depth).unwrap_or(2),
            concurrent_workers: cli.concurrent_workers.or(file.concurrent_workers).unwrap_or(5),
            job_queue_size: cli.job_queue_size.or(file.job_queue_size).unwrap_or(1000),
            goto_timeout: Duration::from_millis(cli.goto_timeout_ms.or(file.goto_timeout_ms).unwrap_or(30_000)),
            robots_timeout: Duration::from_millis(
                cli.robots_timeout_ms.or(file.robots_timeout_ms).unwrap_or(10_000),
            ),
            requeue_threshold: Duration::from_secs(
                cli.requeue_threshold_secs.or(file.requeue_threshold_secs).unwrap_or(3),
            ),
            jitter_min: Duration::from_millis(cli.jitter_min_ms.or(file.jitter_min_ms).unwrap_or(0)),
            jitter_max: Duration::from_millis(cli.jitter_max_ms.or(file.jitter_max_ms).unwrap_or(250)),
            evict_interval: Duration::from_secs(cli.evict_interval_secs.or(file.evict_interval_secs).unwrap_or(600)),
            output_root: cli.output_root.or(file.output_root).unwrap_or_else(|| PathBuf::from("../../files")),
            same_origin_only: cli.same_origin_only || file.same_origin_only.unwrap_or(false),
            agent_name: cli.agent_name.or(file.agent_name).unwrap_or_else(|| "crawler".to_string()),
        })
    }
}
