//! The exercise configuration submitted to the grading platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a pipeline variable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    #[serde(rename = "remote-file")]
    RemoteFile,
    #[serde(rename = "remote-file[]")]
    RemoteFiles,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file[]")]
    Files,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    Strings,
}

impl VariableType {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            VariableType::RemoteFiles | VariableType::Files | VariableType::Strings
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariableType::RemoteFile => "remote-file",
            VariableType::RemoteFiles => "remote-file[]",
            VariableType::File => "file",
            VariableType::Files => "file[]",
            VariableType::String => "string",
            VariableType::Strings => "string[]",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum VariableValue {
    Single(String),
    List(Vec<String>),
}

impl VariableValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            VariableValue::Single(s) => Some(s),
            VariableValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            VariableValue::Single(_) => None,
            VariableValue::List(l) => Some(l),
        }
    }
}

/// A typed input of a pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: VariableType,
    pub value: VariableValue,
}

impl Variable {
    pub fn single(name: &str, typ: VariableType, value: impl Into<String>) -> Variable {
        debug_assert!(!typ.is_array());
        Variable {
            name: name.to_owned(),
            typ,
            value: VariableValue::Single(value.into()),
        }
    }

    pub fn list(name: &str, typ: VariableType, value: Vec<String>) -> Variable {
        debug_assert!(typ.is_array());
        Variable {
            name: name.to_owned(),
            typ,
            value: VariableValue::List(value),
        }
    }
}

/// One pipeline invocation inside a test.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    /// Id of the pipeline to run.
    pub name: String,
    pub variables: Vec<Variable>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    /// Remote id of the test, or its name when no id is known.
    pub name: String,
    pub pipelines: Vec<PipelineStep>,
}

/// All tests compiled for one runtime environment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentBlock {
    /// Runtime environment id.
    pub name: String,
    pub tests: Vec<TestPlan>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ExecutionPlan {
    pub environments: Vec<EnvironmentBlock>,
}

impl ExecutionPlan {
    pub fn environment(&self, name: &str) -> Option<&EnvironmentBlock> {
        self.environments.iter().find(|e| e.name == name)
    }

    pub fn test_count(&self) -> usize {
        self.environments.iter().map(|e| e.tests.len()).sum()
    }
}
