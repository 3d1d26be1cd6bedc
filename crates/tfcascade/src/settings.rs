//! naming settings for fragment and combined files
//!
//! All names have defaults. A `.tfcascade.yaml` in the root directory may override any of them:
//!
//! ```yaml
//! environments_dir: environments
//! combined_vals_file: _all.tfvars
//! ```
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file that marks the root of a tree
pub const SETTINGS_FILE_NAME: &str = ".tfcascade.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Sub-directory of every layer that holds the fragments
    pub environments_dir: String,
    /// Directory handed to derived templates as `templates_dir`
    pub templates_dir: String,
    /// Provenance line, written as a `#` comment at the top of each combined file
    pub autogenerate_comment: String,
    pub combined_vals_file: String,
    pub combined_vars_file: String,
    pub combined_tf_file: String,
    pub combined_derived_file: String,
    pub derived_file: String,
    pub variable_tf_file: String,
    pub vals_file_env_post_string: String,
    pub vars_file_env_post_string: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environments_dir: "env".into(),
            templates_dir: "env".into(),
            autogenerate_comment: "This file generated by tfcascade.".into(),
            combined_vals_file: "_combined.tfvars".into(),
            combined_vars_file: "_combined_variables.tf".into(),
            combined_tf_file: "_combined.tf".into(),
            combined_derived_file: "_combined_derived.tf".into(),
            derived_file: "derived.tfvars".into(),
            variable_tf_file: "variables.tf".into(),
            vals_file_env_post_string: ".tfvars".into(),
            vars_file_env_post_string: "_variables.tf".into(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        tracing::info!(path=%path.display(), "loading settings");

        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_owned(),
            source,
        })?;

        // an empty file is a valid marker that keeps all defaults
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Find the nearest settings file, starting at `start` and walking up
    ///
    /// Walks lexical ancestors only, so relative paths stay relative.
    pub fn find_in_tree(start: &Path) -> Option<PathBuf> {
        find_file_in_tree(start, SETTINGS_FILE_NAME)
    }
}

fn find_file_in_tree(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| {
            // the last ancestor of a relative path is empty, which is the work directory
            if dir.as_os_str().is_empty() {
                Path::new(".").join(file_name)
            } else {
                dir.join(file_name)
            }
        })
        .inspect(|candidate| tracing::trace!(path=%candidate.display(), "looking for settings"))
        .find(|candidate| candidate.is_file())
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Unable to read settings file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse settings file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
