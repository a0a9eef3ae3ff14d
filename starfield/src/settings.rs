use anyhow::{Context, Result};
use cosmos::Theme;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SavedTheme {
    Light,
    Dark,
}

impl From<SavedTheme> for Theme {
    fn from(t: SavedTheme) -> Self {
        match t {
            SavedTheme::Light => Theme::Light,
            SavedTheme::Dark => Theme::Dark,
        }
    }
}

impl From<Theme> for SavedTheme {
    fn from(t: Theme) -> Self {
        match t {
            Theme::Light => SavedTheme::Light,
            Theme::Dark => SavedTheme::Dark,
        }
    }
}

/// Long-lived preferences; survive across runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Prefs {
    pub(crate) theme: SavedTheme,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            theme: SavedTheme::Dark,
        }
    }
}

pub(crate) fn prefs_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "cosmos", "starfield")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(dir.join("prefs.json"))
}

pub(crate) fn load_prefs(path: &Path) -> Prefs {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Prefs>(&s) {
            return v;
        }
        tracing::warn!(path = %path.display(), "ignoring unreadable prefs file");
    }
    Prefs::default()
}

pub(crate) fn save_prefs_atomic(path: &Path, p: &Prefs) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_dark() {
        let dir = tempfile::tempdir().unwrap();
        let p = load_prefs(&dir.path().join("nope.json"));
        assert_eq!(p.theme, SavedTheme::Dark);
    }

    #[test]
    fn malformed_file_defaults_to_dark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{\"theme\": \"sepia\"}").unwrap();
        assert_eq!(load_prefs(&path).theme, SavedTheme::Dark);
    }

    #[test]
    fn saved_theme_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        save_prefs_atomic(&path, &Prefs { theme: SavedTheme::Light }).unwrap();
        save_prefs_atomic(&path, &Prefs { theme: SavedTheme::Light }).unwrap();
        assert_eq!(load_prefs(&path).theme, SavedTheme::Light);
        assert_eq!(Theme::from(load_prefs(&path).theme), Theme::Light);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
