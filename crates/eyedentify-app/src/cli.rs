use std::path::PathBuf;

use clap::Parser;

/// Scan photos for objects and text, keeping a live scan history.
///
/// Image URIs given on the command line are scanned first. Afterwards each
/// line on stdin is either an image URI or one of `history`, `clear`, `quit`.
#[derive(Debug, Parser)]
#[command(name = "eyedentify", version)]
pub struct Args {
    /// JSON config profile; environment variables are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Exit after the command-line images are scanned instead of reading stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Images to scan (`file://` URIs or paths)
    pub images: Vec<String>,
}
