use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::case::CaseStyle;
use crate::NamingError;

pub const CONFIG_FILE_NAME: &str = ".naminglintrc.json";

pub const DEFAULT_IGNORE: [&str; 7] = [
    "node_modules/**",
    "dist/**",
    ".git/**",
    ".vscode/**",
    "package.json",
    "package-lock.json",
    "tsconfig.json",
];

/// Required styles for files and folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRules {
    pub file_case: CaseStyle,
    pub folder_case: CaseStyle,
}

impl Default for CaseRules {
    fn default() -> Self {
        Self {
            file_case: CaseStyle::Kebab,
            folder_case: CaseStyle::Kebab,
        }
    }
}

/// Active naming rules for one scan, as stored in `.naminglintrc.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRules {
    pub rules: CaseRules,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            rules: CaseRules::default(),
            ignore: DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl NamingRules {
    pub fn new(file_case: CaseStyle, folder_case: CaseStyle) -> Self {
        Self {
            rules: CaseRules {
                file_case,
                folder_case,
            },
            ..Self::default()
        }
    }

    pub fn file_case(&self) -> CaseStyle {
        self.rules.file_case
    }

    pub fn folder_case(&self) -> CaseStyle {
        self.rules.folder_case
    }

    pub fn validate(&self) -> Result<(), NamingError> {
        if let Some(idx) = self.ignore.iter().position(|p| p.trim().is_empty()) {
            return Err(NamingError::ConfigInvalid {
                message: format!("ignore pattern #{} is empty", idx + 1),
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, NamingError> {
        let rules: NamingRules =
            serde_json::from_str(json).map_err(|e| NamingError::ConfigInvalid {
                message: e.to_string(),
            })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn to_json(&self) -> Result<String, NamingError> {
        serde_json::to_string_pretty(self).map_err(|e| NamingError::ConfigInvalid {
            message: e.to_string(),
        })
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Loads rules from `<root>/.naminglintrc.json`, falling back to defaults when
/// the file does not exist.
pub fn load_config(root: &Path) -> Result<NamingRules, NamingError> {
    load_config_file(&config_path(root))
}

pub fn load_config_file(path: &Path) -> Result<NamingRules, NamingError> {
    if !path.exists() {
        debug!("No config at {:?}, using defaults", path);
        return Ok(NamingRules::default());
    }

    let content = fs::read_to_string(path).map_err(|e| NamingError::ConfigInvalid {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    let rules = NamingRules::from_json(&content).map_err(|e| match e {
        NamingError::ConfigInvalid { message } => NamingError::ConfigInvalid {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })?;

    info!(
        "Loaded config {:?}: files {}, folders {}",
        path,
        rules.file_case(),
        rules.folder_case()
    );
    Ok(rules)
}

pub fn write_config(root: &Path, rules: &NamingRules) -> Result<PathBuf, NamingError> {
    rules.validate()?;
    let path = config_path(root);
    fs::write(&path, rules.to_json()?)?;
    info!("Wrote config {:?}", path);
    Ok(path)
}
