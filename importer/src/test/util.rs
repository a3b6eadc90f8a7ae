//! Fixtures shared by the tests of this crate.

use crate::model::{
    IoType, Limits, LimitsTable, Pipeline, PipelineParameters, TestDefinition, PROGRAM_SENTINEL,
};

fn default_limits() -> LimitsTable {
    [("default".to_owned(), Limits::new("1", "65536"))]
        .into_iter()
        .collect()
}

/// A test reading stdin and writing stdout, named `{n:02}`, judged by `diff`,
/// with only `default` limits of 1 second and 65536 KiB.
pub fn stdio_test(number: u32) -> TestDefinition {
    TestDefinition {
        number,
        name: format!("{:02}", number),
        in_type: IoType::Stdio,
        out_type: IoType::Stdio,
        in_file: None,
        out_file: None,
        judge: "diff".into(),
        cmd_args: vec![PROGRAM_SENTINEL.into()],
        limits: default_limits(),
        has_custom_judge: false,
        custom_judge_binary: None,
        points: 100,
    }
}

/// Like [`stdio_test`], but reading `in.txt` and writing `out.txt`.
pub fn file_test(number: u32) -> TestDefinition {
    TestDefinition {
        in_type: IoType::File,
        out_type: IoType::File,
        in_file: Some("in.txt".into()),
        out_file: Some("out.txt".into()),
        ..stdio_test(number)
    }
}

fn pipeline(id: &str, envs: &[&str], parameters: PipelineParameters) -> Pipeline {
    Pipeline {
        id: id.into(),
        name: id.into(),
        parameters,
        runtime_environment_ids: envs.iter().map(|e| e.to_string()).collect(),
    }
}

pub fn build_pipeline(id: &str, envs: &[&str]) -> Pipeline {
    pipeline(
        id,
        envs,
        PipelineParameters {
            is_compilation_pipeline: true,
            ..Default::default()
        },
    )
}

pub fn exec_pipeline(id: &str, envs: &[&str], stdout: bool, files: bool) -> Pipeline {
    pipeline(
        id,
        envs,
        PipelineParameters {
            is_execution_pipeline: true,
            produces_stdout: stdout,
            produces_files: files,
            ..Default::default()
        },
    )
}
