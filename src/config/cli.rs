// Command line arguments
// Values given here override the config file and environment

use clap::Parser;

/// Serve, write and delete files under a single directory over HTTP
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rust_fileserver", version, about)]
pub struct Cli {
    #[arg(short = 'd', long, help = "Root directory for files")]
    pub directory: String,

    #[arg(short = 'p', long, help = "Port to listen on [default: 8080]")]
    pub port: Option<u16>,

    #[arg(long, help = "Address to bind [default: 0.0.0.0]")]
    pub host: Option<String>,

    #[arg(
        short = 'c',
        long,
        default_value = "fileserver",
        help = "Config file path (extension optional)"
    )]
    pub config: String,

    #[arg(long, help = "Join request paths verbatim, allowing `..` to leave the root")]
    pub allow_traversal: bool,
}
