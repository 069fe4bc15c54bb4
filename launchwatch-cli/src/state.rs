use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;

/// Overrides the default `~/.launchwatch` directory.
pub const HOME_ENV: &str = "LAUNCHWATCH_HOME";

pub fn launchwatch_home() -> Result<PathBuf> {
    resolve_home(std::env::var(HOME_ENV).ok(), std::env::var("HOME").ok())
}

fn resolve_home(override_dir: Option<String>, home: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    match home {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home).join(".launchwatch")),
        _ => bail!("HOME is not set (or set {HOME_ENV})"),
    }
}

pub fn ensure_launchwatch_home() -> Result<PathBuf> {
    let dir = launchwatch_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Default location of the key-value store document.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(ensure_launchwatch_home()?.join("store.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let dir = resolve_home(Some("/srv/launchwatch".into()), Some("/home/me".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/launchwatch"));
    }

    #[test]
    fn falls_back_to_home() {
        let dir = resolve_home(Some("  ".into()), Some("/home/me".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/me/.launchwatch"));
        assert!(resolve_home(None, None).is_err());
    }
}
