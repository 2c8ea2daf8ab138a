use anyhow::{Context, Result};
use chrono::NaiveDate;
use daygrid_core::Task;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub fn daygrid_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".daygrid"))
}

pub fn ensure_daygrid_home() -> Result<PathBuf> {
    let dir = daygrid_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// One day's tasks as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayFile {
    pub date: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

pub fn read_day(path: &Path) -> Result<DayFile> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn write_day(path: &Path, day: &DayFile) -> Result<()> {
    let json = serde_json::to_string_pretty(day)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
