use anyhow::{Context, Result, bail};
use daygrid_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_daygrid_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daygrid_home()?.join("config.toml"))
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => config_path(),
    }
}

/// Load from `path`, or the default location when `None`. A missing default
/// file means defaults; a missing explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = resolve_path(path)?;
    if !p.exists() {
        if path.is_some() {
            bail!("config file not found: {}", p.display());
        }
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.engine
        .validate()
        .with_context(|| format!("invalid engine settings in {}", p.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let p = resolve_path(path)?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config to `path`, or the default location when `None`.
/// An existing file is left alone.
pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = resolve_path(path)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), Some(&p))?;
    println!("Wrote {}", p.display());
    Ok(())
}
