//! Show or write the effective configuration.

use std::path::PathBuf;

use clipcam_common::config::AppConfig;

pub fn run(config: &AppConfig, path: Option<PathBuf>, write: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let written = match path {
            Some(path) => {
                config.save_to(&path)?;
                path
            }
            None => config.save()?,
        };
        println!("  Wrote {}", written.display());
    }

    Ok(())
}
