use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agentdao")]
#[command(about = "Payment-gated DAO governance simulator")]
pub struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serve the REST API instead of running a single simulation
    #[arg(long)]
    pub serve: bool,

    /// REST port, overrides config and PORT
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write the default config to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_default_config: Option<PathBuf>,
}
