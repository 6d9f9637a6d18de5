use crate::datasources::{DataFrequency, ImportOptions, SensorCategory};
use crate::error::{FieldOpsError, Result};
use crate::logic::hierarchy::DEFAULT_MAX_DEPTH;
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub hierarchy: HierarchyConfig,
    pub logging: LoggingConfig,
}

/// Which optional sensor groups survive import, and the sampling rate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Hz, 1 or 5.
    pub data_frequency: u8,
    pub downforce: bool,
    pub seeding_quality: bool,
    pub soil_sensing: bool,
    /// Insecticide and other `vrAppRateMass*` sensors.
    #[serde(alias = "insecticide")]
    pub granular_application: bool,
    pub liquid_application: bool,
    pub row_unit_depth_control: bool,
    pub row_unit_closing_system: bool,
    pub row_totals: bool,
    pub row_cleaner_system: bool,
    /// Enables every category above.
    pub all_optional: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            data_frequency: 1,
            downforce: false,
            seeding_quality: false,
            soil_sensing: false,
            granular_application: false,
            liquid_application: false,
            row_unit_depth_control: false,
            row_unit_closing_system: false,
            row_totals: false,
            row_cleaner_system: false,
            all_optional: false,
        }
    }
}

impl ImportConfig {
    fn enabled(&self, category: SensorCategory) -> bool {
        self.all_optional
            || match category {
                SensorCategory::Downforce => self.downforce,
                SensorCategory::SeedingQuality => self.seeding_quality,
                SensorCategory::SoilSensing => self.soil_sensing,
                SensorCategory::GranularApplication => self.granular_application,
                SensorCategory::LiquidApplication => self.liquid_application,
                SensorCategory::RowUnitDepthControl => self.row_unit_depth_control,
                SensorCategory::RowUnitClosingSystem => self.row_unit_closing_system,
                SensorCategory::RowTotals => self.row_totals,
                SensorCategory::RowCleanerSystem => self.row_cleaner_system,
            }
    }

    pub fn to_options(&self) -> Result<ImportOptions> {
        let data_frequency = DataFrequency::from_hz(self.data_frequency).ok_or_else(|| {
            FieldOpsError::Config(format!(
                "data_frequency must be 1 or 5, got {}",
                self.data_frequency
            ))
        })?;

        Ok(ImportOptions {
            data_frequency,
            categories: SensorCategory::all()
                .iter()
                .copied()
                .filter(|c| self.enabled(*c))
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub max_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    /// Load from the override path or the standard locations. Missing files
    /// fall back to defaults; an explicit override must exist.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(FieldOpsError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| FieldOpsError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse YAML text after `${VAR}` substitution.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| FieldOpsError::Config(format!("Failed to parse config: {}", e)))?;

        config.import.to_options()?;
        Ok(config)
    }

    /// First existing config: `config/fieldops.yaml`, then the XDG config dir.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/fieldops.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("fieldops").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/fieldops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FieldOpsError::Config("Cannot determine config directory".into()))?
            .join("fieldops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up FieldOps!");
        println!();

        println!("Import");
        let data_frequency: u8 = Input::new()
            .with_prompt("  Data frequency in Hz (1 or 5)")
            .default(1)
            .validate_with(|hz: &u8| match DataFrequency::from_hz(*hz) {
                Some(_) => Ok(()),
                None => Err("must be 1 or 5"),
            })
            .interact_text()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        let all_optional = Confirm::new()
            .with_prompt("  Import every optional sensor group?")
            .default(false)
            .interact()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        let mut import = ImportConfig {
            data_frequency,
            all_optional,
            ..Default::default()
        };
        if !all_optional {
            for category in SensorCategory::all() {
                let enabled = Confirm::new()
                    .with_prompt(format!("  Import {} sensors?", category))
                    .default(false)
                    .interact()
                    .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;
                import.set(*category, enabled);
            }
        }

        println!();

        println!("Logging");
        let level: String = Input::new()
            .with_prompt("  Default log level")
            .default("warn".into())
            .interact_text()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            import,
            hierarchy: HierarchyConfig::default(),
            logging: LoggingConfig { level },
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| FieldOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# FieldOps Configuration\n# Generated by `fieldops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| FieldOpsError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }
}

impl ImportConfig {
    fn set(&mut self, category: SensorCategory, enabled: bool) {
        let flag = match category {
            SensorCategory::Downforce => &mut self.downforce,
            SensorCategory::SeedingQuality => &mut self.seeding_quality,
            SensorCategory::SoilSensing => &mut self.soil_sensing,
            SensorCategory::GranularApplication => &mut self.granular_application,
            SensorCategory::LiquidApplication => &mut self.liquid_application,
            SensorCategory::RowUnitDepthControl => &mut self.row_unit_depth_control,
            SensorCategory::RowUnitClosingSystem => &mut self.row_unit_closing_system,
            SensorCategory::RowTotals => &mut self.row_totals,
            SensorCategory::RowCleanerSystem => &mut self.row_cleaner_system,
        };
        *flag = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.import.data_frequency, 1);
        assert_eq!(config.hierarchy.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.logging.level, "warn");

        let options = config.import.to_options().unwrap();
        assert_eq!(options.data_frequency, DataFrequency::OneHz);
        assert!(options.categories.is_empty());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = Config::from_yaml("import:\n  data_frequency: 5\n  downforce: true\n").unwrap();
        assert_eq!(config.hierarchy.max_depth, DEFAULT_MAX_DEPTH);

        let options = config.import.to_options().unwrap();
        assert_eq!(options.data_frequency, DataFrequency::FiveHz);
        assert!(options.includes(SensorCategory::Downforce));
        assert!(!options.includes(SensorCategory::SoilSensing));
    }

    #[test]
    fn insecticide_key_enables_granular_application() {
        let config = Config::from_yaml("import:\n  insecticide: true\n").unwrap();
        assert!(config.import.granular_application);
        let options = config.import.to_options().unwrap();
        assert!(options.keeps_representation("vrAppRateMassActual"));
        assert!(!options.keeps_representation("vrAppRateVolumeActual"));
    }

    #[test]
    fn all_optional_enables_every_category() {
        let import = ImportConfig {
            all_optional: true,
            ..Default::default()
        };
        let options = import.to_options().unwrap();
        assert_eq!(options.categories.len(), SensorCategory::all().len());
    }

    #[test]
    fn invalid_frequency_is_config_error() {
        let err = Config::from_yaml("import:\n  data_frequency: 10\n").unwrap_err();
        assert!(matches!(err, FieldOpsError::Config(_)));
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("FIELDOPS_TEST_LOG_LEVEL", "debug");
        let config = Config::from_yaml("logging:\n  level: ${FIELDOPS_TEST_LOG_LEVEL}\n").unwrap();
        assert_eq!(config.logging.level, "debug");

        let untouched = Config::substitute_env_vars("level: ${FIELDOPS_TEST_UNSET_VAR}").unwrap();
        assert_eq!(untouched, "level: ${FIELDOPS_TEST_UNSET_VAR}");
    }

    #[test]
    fn set_toggles_one_category() {
        let mut import = ImportConfig::default();
        import.set(SensorCategory::RowTotals, true);
        assert!(import.row_totals);
        assert!(import.enabled(SensorCategory::RowTotals));
        assert!(!import.enabled(SensorCategory::Downforce));
    }

    #[test]
    fn missing_override_is_an_error() {
        let err = Config::load(Some(PathBuf::from("/nonexistent/fieldops.yaml"))).unwrap_err();
        assert!(matches!(err, FieldOpsError::Config(_)));
    }
}
