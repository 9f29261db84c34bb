use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Args {
    /// Path to the TOML configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    #[clap(short = 'a', long)]
    pub expose_address: Option<String>,

    #[clap(short = 'p', long)]
    pub expose_port: Option<u16>,

    /// TOML file holding the site options. Options are kept in memory without it
    #[clap(short = 's', long)]
    pub store: Option<PathBuf>,

    /// Expose prometheus metrics on this port
    #[clap(short = 'm', long)]
    pub metrics_port: Option<u16>,

    /// Manage only the username validation flag
    #[clap(long, default_value_t = false)]
    pub validation_only: bool,
}
