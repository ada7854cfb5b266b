use clap::Parser;

/// c1219-decode - decode captured ANSI C12.19 meter tables to JSON
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config")]
    pub config_file: Option<String>,

    /// Capture file to decode; overrides capture_file in the config
    #[clap(long = "capture")]
    pub capture: Option<String>,

    /// Table to decode, may be repeated; overrides tables in the config
    #[clap(short = 't', long = "table")]
    pub tables: Vec<u16>,

    /// Pretty-print the JSON output
    #[clap(long = "pretty")]
    pub pretty: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}
