use crate::model::IoDirection;
use err_derive::Error;
use std::fmt;

/// Role of a pipeline inside a compiled test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRole {
    Build,
    ExecStdout,
    ExecFiles,
}

impl fmt::Display for PipelineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineRole::Build => "build",
            PipelineRole::ExecStdout => "stdout execution",
            PipelineRole::ExecFiles => "file execution",
        })
    }
}

/// Why a test could not be compiled. None of these stop the other tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(
        display = "No {} pipeline for test {} in environment {}",
        role,
        test,
        environment
    )]
    MissingPipeline {
        test: String,
        environment: String,
        role: PipelineRole,
    },

    #[error(
        display = "Test {} has neither `{}` nor `default` limits",
        test,
        extension
    )]
    MissingLimits { test: String, extension: String },

    #[error(display = "Test {} uses `dir` {}put, which is not supported", test, direction)]
    UnsupportedIoMode {
        test: String,
        direction: IoDirection,
    },

    #[error(display = "No runtime environment configured for extension `{}`", extension)]
    UnknownExtension { extension: String },

    #[error(display = "Tasks of test {} do not fit below the maximum priority", test)]
    PriorityOverflow { test: String },
}

impl CompileError {
    /// The test this error belongs to, if it is tied to one.
    pub fn test(&self) -> Option<&str> {
        match self {
            CompileError::MissingPipeline { test, .. }
            | CompileError::MissingLimits { test, .. }
            | CompileError::UnsupportedIoMode { test, .. }
            | CompileError::PriorityOverflow { test } => Some(test),
            CompileError::UnknownExtension { .. } => None,
        }
    }
}

/// A finding that does not prevent compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// Judge identifier missing from the alias table, passed through as is.
    UnmappedJudge { test: String, judge: String },
    /// Two tests share a name; the later one wins in the name-to-id mapping.
    DuplicateTestName { name: String },
    /// Several pipelines share a name; name lookups take the first one.
    DuplicatePipelineName { name: String },
    /// A test missing from the remote test listing keeps its own name.
    MissingTestId { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmappedJudge { test, judge } => {
                write!(f, "Judge `{}` of test {} has no alias, used as is", judge, test)
            }
            Diagnostic::DuplicateTestName { name } => {
                write!(f, "Test name `{}` is used more than once", name)
            }
            Diagnostic::DuplicatePipelineName { name } => {
                write!(f, "Pipeline name `{}` is used more than once", name)
            }
            Diagnostic::MissingTestId { name } => {
                write!(f, "Test `{}` is not registered remotely, using its name", name)
            }
        }
    }
}
