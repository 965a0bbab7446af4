use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fair-signup")]
#[command(about = "Christmas-fair registration and check-in flows")]
pub struct Cli {
    #[arg(long, default_value = "event.toml", help = "Event configuration file")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 從 TOML 檔案送出一筆報名
    Register {
        #[arg(long, help = "Submission input file")]
        input: PathBuf,
    },
    /// Look up a registration id and record the health declaration
    Checkin {
        #[arg(long, help = "Event day key, e.g. day1")]
        date: String,
        #[arg(long, help = "Registration id (typed or scanned)")]
        id: String,
        #[arg(long, default_value_t = true, help = "Health condition confirmed")]
        healthy: bool,
    },
    /// Validate the event configuration and print a summary
    CheckConfig,
}
