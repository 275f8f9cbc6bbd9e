//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading day plans and
//! engine settings from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{DayPlanConfig, DayPlanId, DayPlanTable, EngineSettings};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml        # Engine settings
/// └── day_plans/
///     ├── standard.yaml  # One day plan per file
///     └── early.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use workday_engine::config::{ConfigLoader, DayPlanId};
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let plan = loader.get_day_plan(&DayPlanId::from("standard")).unwrap();
/// println!("Target minutes: {:?}", plan.regular_hours);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    plans: DayPlanTable,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if `engine.yaml` or the `day_plans` directory is
    /// missing, if any file contains invalid YAML, or if any plan fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let plans = Self::load_day_plans(&path.join("day_plans"))?;
        let plans = DayPlanTable::from_plans(plans)?;

        debug!(
            path = %path.display(),
            plan_count = plans.len(),
            max_workers = settings.recalculation.max_workers,
            "Loaded engine configuration"
        );

        Ok(Self { settings, plans })
    }

    /// Builds a loader from already-parsed parts.
    pub fn from_parts(settings: EngineSettings, plans: Vec<DayPlanConfig>) -> EngineResult<Self> {
        Ok(Self {
            settings,
            plans: DayPlanTable::from_plans(plans)?,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all day plan files from the plans directory, sorted by file name.
    fn load_day_plans(plans_dir: &Path) -> EngineResult<Vec<DayPlanConfig>> {
        let plans_dir_str = plans_dir.display().to_string();

        let entries = fs::read_dir(plans_dir).map_err(|_| EngineError::ConfigNotFound {
            path: plans_dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: plans_dir_str.clone(),
            })?;
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no day plan files found)", plans_dir_str),
            });
        }

        paths
            .iter()
            .map(|path| Self::load_yaml::<DayPlanConfig>(path))
            .collect()
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the day plan table.
    pub fn plans(&self) -> &DayPlanTable {
        &self.plans
    }

    /// Consumes the loader and returns the day plan table.
    pub fn into_plans(self) -> DayPlanTable {
        self.plans
    }

    /// Gets a day plan by its id.
    pub fn get_day_plan(&self, id: &DayPlanId) -> EngineResult<&DayPlanConfig> {
        self.plans.get(id)
    }
}
