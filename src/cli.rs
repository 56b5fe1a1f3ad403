//! Command line interface of the `grole` binary.
//!
//! Flags override values from the optional configuration file, which in turn
//! override the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ServerConfig;

#[derive(Debug, Parser)]
#[command(name = "grole")]
#[command(version, about = "A simple HTTP server serving a directory", long_about = None)]
pub struct Cli {
    /// Address to listen on [default: localhost]
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port to listen on [default: 1234]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve [default: .]
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Do not show directory indexes
    #[arg(short, long)]
    pub noindex: bool,

    /// Verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serve route documentation at this URL
    #[arg(long, value_name = "URL")]
    pub doc: Option<String>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(address) = &self.address {
            config.listener.address = address.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(directory) = &self.directory {
            config.files.directory = directory.clone();
        }
        if self.noindex {
            config.files.index = false;
        }
        if self.verbose {
            config.observability.log_level = "debug".to_string();
        } else if self.quiet {
            config.observability.log_level = "error".to_string();
        }
        if let Some(doc) = &self.doc {
            config.files.doc_path = Some(doc.clone());
        }
    }
}
