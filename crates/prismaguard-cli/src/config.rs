use prismaguard::SqlDialect;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional project config (`prismaguard.toml`). All keys are optional;
/// command-line flags win over config values.
///
/// ```toml
/// [schema]
/// path = "prisma/schema.prisma"
/// dmmf_path = "tests/fixtures/dmmf.json"
/// dialect = "postgres"
/// ```
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    pub path: Option<String>,
    pub dmmf_path: Option<String>,
    pub dialect: Option<SqlDialect>,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;

        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("failed to parse config file {}: {e}", config_path.display())
        })?;

        Ok(Self { config_dir, file })
    }

    /// Load the config when the file exists; otherwise fall back to defaults.
    pub fn load_optional(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self {
                config_dir: PathBuf::from("."),
                file: ConfigFile::default(),
            })
        }
    }

    /// Resolve a config-relative path.
    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let raw = r#"
[schema]
path = "prisma/schema.prisma"
dmmf_path = "fixtures/dmmf.json"
dialect = "mysql"
"#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(file.schema.path.as_deref(), Some("prisma/schema.prisma"));
        assert_eq!(file.schema.dialect, Some(SqlDialect::Mysql));
    }

    #[test]
    fn empty_config_is_valid() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.schema.path.is_none());
        assert!(file.schema.dialect.is_none());
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let raw = "[schema]\ndialect = \"mariadb\"\n";
        assert!(toml::from_str::<ConfigFile>(raw).is_err());
    }

    #[test]
    fn relative_paths_resolve_against_the_config_dir() {
        let config = ProjectConfig {
            config_dir: PathBuf::from("/srv/app"),
            file: ConfigFile::default(),
        };
        assert_eq!(
            config.resolve_path("prisma/schema.prisma"),
            PathBuf::from("/srv/app/prisma/schema.prisma")
        );
        assert_eq!(config.resolve_path("/abs/x"), PathBuf::from("/abs/x"));
    }
}
