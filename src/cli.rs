//! Command-line interface.
//!
//! Connection settings come from the environment; the command line only
//! controls log verbosity.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "vertica-mcp")]
#[command(version, about = "Vertica MCP server over stdio", long_about = None)]
pub struct Cli {
    /// Enable debug logging (same as DEBUG=true)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self, env_debug: bool) -> &'static str {
        if self.debug || env_debug {
            "vertica_mcp=debug,info"
        } else {
            "vertica_mcp=info,warn"
        }
    }
}
