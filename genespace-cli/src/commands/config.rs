//! Config command implementation - print the effective or an example configuration

use anyhow::{Context, Result};

use crate::config::Config;

pub fn execute(config: &Config, example: bool) -> Result<()> {
    let text = if example {
        Config::example_toml()
    } else {
        config.to_toml()
    }
    .context("Failed to serialize configuration")?;
    print!("{}", text);
    Ok(())
}
