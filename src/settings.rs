//! Backend settings, loaded with confique from the environment and an
//! optional TOML settings file.
//!
//! | Env var        | Field    | Default                     |
//! |----------------|----------|-----------------------------|
//! | `KVFIG_DIR`    | `dir`    | platform config dir         |
//! | `KVFIG_FORMAT` | `format` | `json`                      |

use std::path::{Path, PathBuf};

use confique::Config;

use crate::types::{FileFormat, UnknownVariant};

/// Settings for the file backend.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Directory holding one file per namespace. Defaults to the platform
    /// config directory for kvfig.
    #[config(env = "KVFIG_DIR")]
    pub dir: Option<PathBuf>,

    /// On-disk format of namespace files: "json" or "toml".
    #[config(env = "KVFIG_FORMAT", parse_env = parse_format, default = "json")]
    pub format: FileFormat,
}

fn parse_format(s: &str) -> Result<FileFormat, UnknownVariant> {
    s.parse()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: FileFormat::default(),
        }
    }
}

impl StoreSettings {
    /// Load settings from `KVFIG_*` environment variables.
    pub fn from_env() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    /// Load settings from the environment layered over a TOML settings file.
    /// A missing file is skipped.
    pub fn load(file: &Path) -> Result<Self, confique::Error> {
        Self::builder().env().file(file).load()
    }

    /// A commented TOML template describing every setting.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::ScopedEnv;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_sources() {
        let settings = StoreSettings::builder().load().unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn reads_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kvfig.toml");
        fs::write(&path, "dir = \"/var/lib/app\"\nformat = \"toml\"\n").unwrap();

        let settings = StoreSettings::builder().file(&path).load().unwrap();
        assert_eq!(settings.dir, Some(PathBuf::from("/var/lib/app")));
        assert_eq!(settings.format, FileFormat::Toml);
    }

    #[test]
    fn missing_settings_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let settings = StoreSettings::builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(settings.format, FileFormat::Json);
    }

    #[test]
    fn rejects_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kvfig.toml");
        fs::write(&path, "format = \"yaml\"\n").unwrap();
        assert!(StoreSettings::builder().file(&path).load().is_err());
    }

    #[test]
    fn parse_format_accepts_env_spelling() {
        assert_eq!(parse_format("TOML").unwrap(), FileFormat::Toml);
        assert!(parse_format("ini").is_err());
    }

    #[test]
    fn from_env_reads_kvfig_vars() {
        let _env = ScopedEnv::set(&[("KVFIG_DIR", "/srv/app"), ("KVFIG_FORMAT", "TOML")]);
        let settings = StoreSettings::from_env().unwrap();
        assert_eq!(settings.dir, Some(PathBuf::from("/srv/app")));
        assert_eq!(settings.format, FileFormat::Toml);
    }

    #[test]
    fn from_env_without_vars_uses_defaults() {
        let _env = ScopedEnv::set(&[]);
        assert_eq!(StoreSettings::from_env().unwrap(), StoreSettings::default());
    }

    #[test]
    fn env_is_layered_over_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kvfig.toml");
        fs::write(&path, "dir = \"/from/file\"\nformat = \"json\"\n").unwrap();

        let _env = ScopedEnv::set(&[("KVFIG_FORMAT", "toml")]);
        let settings = StoreSettings::load(&path).unwrap();
        assert_eq!(settings.dir, Some(PathBuf::from("/from/file")));
        assert_eq!(settings.format, FileFormat::Toml);
    }

    #[test]
    fn from_env_rejects_unknown_format() {
        let _env = ScopedEnv::set(&[("KVFIG_FORMAT", "yaml")]);
        assert!(StoreSettings::from_env().is_err());
    }

    #[test]
    fn template_documents_fields() {
        let template = StoreSettings::template();
        assert!(template.contains("dir"));
        assert!(template.contains("format"));
        assert!(template.contains("KVFIG_DIR"));
    }
}
