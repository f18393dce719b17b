use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

/// Directory the session keeps its logs in. By default `$XDG_STATE_HOME/daytally` or
/// `$HOME/.local/state/daytally` (`%APPDATA%\daytally` on Windows).
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = state_home()?;
    path.push("daytally");
    ensure_dir(path)
}

pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v).with_context(|| format!("Couldn't create directory {path:?}")),
    }
}

#[cfg(windows)]
fn state_home() -> Result<PathBuf> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA should be present on Windows")
}

#[cfg(not(windows))]
fn state_home() -> Result<PathBuf> {
    env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .context("Couldn't find neither XDG_STATE_HOME nor HOME")
}
