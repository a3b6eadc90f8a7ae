//! Listings fetched from the grading platform: pipelines, uploaded files and
//! the exercise's remote tests.

use crate::util::single_or_array;
use serde::{Deserialize, Serialize};

/// Capability flags of a pipeline. Flags missing from a listing are `false`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineParameters {
    pub is_compilation_pipeline: bool,
    pub is_execution_pipeline: bool,
    pub produces_stdout: bool,
    pub produces_files: bool,
}

/// A named execution primitive of the grading platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    /// Not unique: several versions of a pipeline may share one name.
    pub name: String,
    #[serde(default)]
    pub parameters: PipelineParameters,
    #[serde(default, deserialize_with = "single_or_array")]
    pub runtime_environment_ids: Vec<String>,
}

impl Pipeline {
    pub fn supports(&self, environment: &str) -> bool {
        self.runtime_environment_ids.iter().any(|env| env == environment)
    }
}

/// The pipeline listing, in the order the platform returned it.
///
/// Order matters: every lookup picks the first pipeline that fits.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PipelineCatalog {
    pub pipelines: Vec<Pipeline>,
}

impl PipelineCatalog {
    pub fn new(pipelines: Vec<Pipeline>) -> PipelineCatalog {
        PipelineCatalog { pipelines }
    }

    /// First pipeline satisfying `pred`.
    pub fn first_where(&self, pred: impl FnMut(&&Pipeline) -> bool) -> Option<&Pipeline> {
        self.pipelines.iter().find(pred)
    }

    /// Names carried by more than one pipeline, each reported once.
    pub fn duplicate_names(&self) -> Vec<&str> {
        use itertools::Itertools;

        self.pipelines
            .iter()
            .map(|p| p.name.as_str())
            .enumerate()
            .filter(|(idx, name)| self.pipelines[..*idx].iter().any(|p| p.name == *name))
            .map(|(_, name)| name)
            .unique()
            .collect()
    }
}

/// A supplementary file already uploaded to the exercise.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub id: String,
}

/// The exercise's uploaded files, in upload listing order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FileIndex {
    pub files: Vec<UploadedFile>,
}

impl FileIndex {
    pub fn new(files: Vec<UploadedFile>) -> FileIndex {
        FileIndex { files }
    }

    /// Build an index from bare names, for callers that have no remote ids.
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> FileIndex {
        FileIndex {
            files: names
                .into_iter()
                .map(|name| {
                    let name = name.into();
                    UploadedFile {
                        id: name.clone(),
                        name,
                    }
                })
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

/// A test as registered on the grading platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExerciseTest {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_listing() {
        let catalog: PipelineCatalog = serde_json::from_str(
            r#"[
                {
                    "id": "p1",
                    "name": "C++ compilation",
                    "parameters": {"isCompilationPipeline": true, "hasEntryPoint": false},
                    "runtimeEnvironmentIds": ["cxx11-gcc-linux"]
                },
                {
                    "id": "p2",
                    "name": "stdout",
                    "parameters": {"isExecutionPipeline": true, "producesStdout": true},
                    "runtimeEnvironmentIds": "cxx11-gcc-linux"
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.pipelines.len(), 2);
        assert!(catalog.pipelines[0].parameters.is_compilation_pipeline);
        assert!(!catalog.pipelines[0].parameters.produces_files);
        assert!(catalog.pipelines[1].supports("cxx11-gcc-linux"));
        assert!(!catalog.pipelines[1].supports("java8"));
    }

    #[test]
    fn duplicate_names_reported_once() {
        let p = |id: &str, name: &str| Pipeline {
            id: id.into(),
            name: name.into(),
            parameters: Default::default(),
            runtime_environment_ids: vec![],
        };
        let catalog = PipelineCatalog::new(vec![
            p("1", "compile"),
            p("2", "run"),
            p("3", "compile"),
            p("4", "compile"),
        ]);
        assert_eq!(catalog.duplicate_names(), vec!["compile"]);
    }

    #[test]
    fn file_index_names() {
        let index = FileIndex::new(vec![
            UploadedFile {
                name: "1.in".into(),
                id: "abc".into(),
            },
            UploadedFile {
                name: "1.out".into(),
                id: "def".into(),
            },
        ]);
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["1.in", "1.out"]);
        assert_eq!(FileIndex::from_names(["x"]).files[0].id, "x");
    }
}
