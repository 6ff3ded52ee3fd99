/// Named filter presets stored side by side in one directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

const PRESET_EXTENSION: &str = "ron";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invalid preset name '{0}': use letters, digits and '_' only")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Preset names are ASCII letters, digits and underscores, and not empty.
pub fn is_valid_preset_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Path of the preset `name` inside `dir`.
pub fn preset_path(dir: &Path, name: &str) -> Result<PathBuf, PresetError> {
    if !is_valid_preset_name(name) {
        return Err(PresetError::InvalidName(name.to_string()));
    }
    Ok(dir.join(name).with_extension(PRESET_EXTENSION))
}

/// Sorted names of the presets found in `dir`. A missing directory has none.
pub fn list_presets(dir: &Path) -> Result<Vec<String>, PresetError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some(PRESET_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if is_valid_preset_name(stem) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
