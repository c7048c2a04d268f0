use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "volboost-sim")]
#[command(about = "Drive the volume amplification engine against a headless document")]
pub struct Cli {
    /// JSON scenario to replay. A built-in demo runs when omitted.
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// JSON host policy overriding the built-in ignored/fallback lists.
    #[arg(long)]
    pub host_policy: Option<PathBuf>,

    /// Volume to request once the scenario has been replayed.
    #[arg(long)]
    pub volume: Option<i64>,

    /// Simulate a context without audio routing (companion-only).
    #[arg(long, default_value_t = false)]
    pub no_audio_facility: bool,

    /// Audio contexts the headless facility allows per document.
    #[arg(long, default_value_t = 6)]
    pub max_contexts: usize,
}
