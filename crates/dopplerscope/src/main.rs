#![forbid(unsafe_code)]

//! # Dopplerscope
//!
//! Watch and hear a sound source fly past an observer.
//!
//! ## Usage
//!
//! ```bash
//! dopplerscope                                # interactive flyby
//! dopplerscope --headless --duration 5        # one text line per frame
//! dopplerscope --config flyby.toml -f 440     # file settings, flag override
//! ```

use anyhow::Context;
use dopplerscope::cli::Cli;
use dopplerscope::config::Config;
use dopplerscope::logging::{self, LogTarget};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let target = LogTarget::for_run(cli.headless, cli.log_file.as_deref());
    logging::init(target, cli.log_level())?;

    let config = Config::from_cli(&cli).context("invalid configuration")?;
    dopplerscope::run(&cli, &config)?;

    Ok(())
}
