use crate::generator::GeneratorConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Theme {
    /// `[theme.colors.<family>]` tables, each shade becoming
    /// `--color-<family>-<shade>`.
    #[serde(default)]
    pub colors: BTreeMap<String, BTreeMap<String, String>>,
    /// Raw theme variables; a leading `--` is optional.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub minify: bool,
    #[serde(default = "default_tree_shake")]
    pub tree_shake: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(&text)
}

pub fn from_str(text: &str) -> Result<Config> {
    Ok(toml::from_str(text)?)
}

impl Config {
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut variables = Vec::new();
        for (family, shades) in &self.theme.colors {
            for (shade, value) in shades {
                variables.push((format!("--color-{}-{}", family, shade), value.clone()));
            }
        }
        for (name, value) in &self.theme.variables {
            let name = if name.starts_with("--") {
                name.clone()
            } else {
                format!("--{}", name)
            };
            variables.push((name, value.clone()));
        }

        GeneratorConfig {
            minify: self.output.minify,
            tree_shake: self.output.tree_shake,
            variables,
        }
    }
}

fn default_tree_shake() -> bool {
    true
}

impl Default for Output {
    fn default() -> Self {
        Self {
            minify: false,
            tree_shake: default_tree_shake(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, from_str, load};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn loads_toml_config() {
        let path = temp_path("ironwind_config");
        let _ = fs::write(&path, "output = { minify = true }");
        let config = load(&path).expect("config should parse");
        assert!(config.output.minify);
        assert!(config.output.tree_shake);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn defaults_when_missing_sections() {
        let path = temp_path("ironwind_config_default");
        let _ = fs::write(&path, "");
        let config = load(&path).expect("config should parse");
        assert!(config.theme.colors.is_empty());
        assert!(!config.output.minify);
        assert!(config.output.tree_shake);
        assert_eq!(config, Config::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn loads_theme_colors_and_variables() {
        let config = from_str(
            r##"
[theme.colors.gray]
100 = "#f3f4f6"
500 = "#6b7280"

[theme.colors.brand]
500 = "#3b82f6"

[theme.variables]
"--radius-card" = "10px"
spacing = "4px"

[output]
minify = true
tree_shake = false
"##,
        )
        .expect("config should parse");
        assert_eq!(config.theme.colors["gray"]["100"], "#f3f4f6");

        let generator = config.generator_config();
        assert!(generator.minify);
        assert!(!generator.tree_shake);
        assert_eq!(
            generator.variables,
            vec![
                ("--color-brand-500".to_string(), "#3b82f6".to_string()),
                ("--color-gray-100".to_string(), "#f3f4f6".to_string()),
                ("--color-gray-500".to_string(), "#6b7280".to_string()),
                ("--radius-card".to_string(), "10px".to_string()),
                ("--spacing".to_string(), "4px".to_string()),
            ]
        );
    }

    #[test]
    fn reports_read_and_parse_errors() {
        let missing = temp_path("ironwind_config_missing");
        assert!(matches!(load(&missing), Err(ConfigError::Read { .. })));
        assert!(matches!(from_str("output = 3"), Err(ConfigError::Parse(_))));
    }

    fn temp_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}.toml", prefix, nanos))
    }
}
