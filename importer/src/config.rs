//! Importer configuration. Every table has a documented default, and a config
//! file only needs to list what it changes.

use crate::{
    task_graph::TaskGraphOptions,
    util::{load_document, LoadError},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "import-config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    /// Source file extension to runtime environment id.
    pub extension_to_runtime: BTreeMap<String, String>,
    /// Legacy judge identifiers to judge names of the grading platform.
    pub judges: JudgeAliases,
    /// Pipelines pinned by literal name instead of capability flags.
    pub pipelines: PipelineNames,
    /// Defaults of the emitted sandbox task graphs.
    pub task_graph: TaskGraphOptions,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let extension_to_runtime = [
            ("cs", "mono46"),
            ("c", "c-gcc-linux"),
            ("pas", "freepascal-linux"),
            ("java", "java8"),
            ("cpp", "cxx11-gcc-linux"),
        ]
        .iter()
        .map(|&(ext, env)| (ext.into(), env.into()))
        .collect();

        ImportConfig {
            extension_to_runtime,
            judges: JudgeAliases::default(),
            pipelines: PipelineNames::default(),
            task_graph: TaskGraphOptions::default(),
        }
    }
}

impl ImportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<ImportConfig, LoadError> {
        load_document(path)
    }

    /// Find and load the config: an explicit path first, then
    /// `./import-config.toml`, then `<config dir>/codex-importer/config.toml`.
    /// Falls back to the defaults when none exists.
    pub fn discover(explicit: Option<&Path>) -> Result<ImportConfig, LoadError> {
        if let Some(path) = explicit {
            return ImportConfig::load(path);
        }

        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE_NAME)).chain(
            dirs::config_dir().map(|dir| dir.join("codex-importer").join("config.toml")),
        );
        for path in candidates {
            if path.is_file() {
                tracing::info!(path = %path.display(), "Using config file");
                return ImportConfig::load(&path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(ImportConfig::default())
    }

    pub fn environment_for(&self, extension: &str) -> Option<&str> {
        self.extension_to_runtime.get(extension).map(|s| s.as_str())
    }
}

/// The judge alias table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct JudgeAliases(pub BTreeMap<String, String>);

impl Default for JudgeAliases {
    fn default() -> Self {
        JudgeAliases(
            [
                ("bin/codex_judge", "recodex-judge-normal"),
                ("bin/codex_shufflejudge", "recodex-judge-shuffle"),
                ("diff", "diff"),
            ]
            .iter()
            .map(|&(from, to)| (from.into(), to.into()))
            .collect(),
        )
    }
}

/// Outcome of a judge alias lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeResolution<'a> {
    Mapped(&'a str),
    /// Not in the table; the identifier is used as is.
    Unmapped(&'a str),
}

impl<'a> JudgeResolution<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            JudgeResolution::Mapped(name) | JudgeResolution::Unmapped(name) => name,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, JudgeResolution::Mapped(_))
    }
}

impl JudgeAliases {
    pub fn resolve<'a>(&'a self, judge: &'a str) -> JudgeResolution<'a> {
        match self.0.get(judge) {
            Some(name) => JudgeResolution::Mapped(name),
            None => JudgeResolution::Unmapped(judge),
        }
    }
}

/// Literal pipeline names overriding capability matching, per pipeline role.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineNames {
    pub build: Option<String>,
    pub exec_stdout: Option<String>,
    pub exec_files: Option<String>,
}
