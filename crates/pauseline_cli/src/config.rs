//! Composition file handling
//!
//! A composition lives in a single TOML file (`pauseline.toml` by default).
//! When no file is given and none exists in the current directory, the
//! built-in demo composition is used.

use anyhow::{Context, Result};
use pauseline_animation::CompositionConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Composition file looked up in the current directory
pub const DEFAULT_FILE: &str = "pauseline.toml";

/// Load and validate a composition file
pub fn load(path: &Path) -> Result<CompositionConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    CompositionConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `path`, or `pauseline.toml` if present, or fall back to the demo
pub fn load_or_demo(path: Option<&Path>) -> Result<(CompositionConfig, Option<PathBuf>)> {
    if let Some(path) = path {
        return Ok((load(path)?, Some(path.to_path_buf())));
    }
    let default = PathBuf::from(DEFAULT_FILE);
    if default.exists() {
        let config = load(&default)?;
        return Ok((config, Some(default)));
    }
    Ok((CompositionConfig::demo(), None))
}

/// Write the demo composition to `path`, refusing to overwrite
pub fn write_demo(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    let content = CompositionConfig::demo()
        .to_toml()
        .context("Failed to serialize demo composition")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pauseline-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(DEFAULT_FILE)
    }

    #[test]
    fn test_demo_written_then_loaded() {
        let path = scratch("demo");
        let _ = fs::remove_file(&path);

        write_demo(&path, false).unwrap();
        assert_eq!(load(&path).unwrap(), CompositionConfig::demo());

        assert!(write_demo(&path, false).is_err());
        write_demo(&path, true).unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_reports_path() {
        let path = scratch("broken");
        fs::write(&path, "max_time = -1.0\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
        assert!(format!("{err:#}").contains("Invalid max time"));
        fs::remove_file(&path).unwrap();

        assert!(load(&path).is_err());
    }
}
