//! Variables handed to the execution pipeline of a test.
//!
//! Binding is a pure function of the test, the judge table and the uploaded
//! file listing. Nothing here logs or touches the filesystem.

use super::CompileError;
use crate::{
    config::{JudgeAliases, JudgeResolution},
    model::{FileIndex, IoDirection, IoType, TestDefinition, Variable, VariableType},
};

pub const INPUT_FILE: &str = "input-file";
pub const INPUT_FILES: &str = "input-files";
pub const ACTUAL_INPUTS: &str = "actual-inputs";
pub const EXPECTED_OUTPUT: &str = "expected-output";
pub const ACTUAL_OUTPUT: &str = "actual-output";
pub const JUDGE_TYPE: &str = "judge-type";
pub const RUN_ARGS: &str = "run-args";

/// Where a `file` test's output lands when the test does not name it.
pub fn default_actual_output(test: &TestDefinition) -> String {
    format!("{}.actual.out", test.number)
}

/// Variables of one test, plus how its judge was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<'a> {
    pub variables: Vec<Variable>,
    pub judge: JudgeResolution<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct VariableBinder<'a> {
    judges: &'a JudgeAliases,
    files: &'a FileIndex,
}

impl<'a> VariableBinder<'a> {
    pub fn new(judges: &'a JudgeAliases, files: &'a FileIndex) -> VariableBinder<'a> {
        VariableBinder { judges, files }
    }

    /// Bind the execution variables of `test`.
    ///
    /// Order is fixed: input, `expected-output`, `judge-type`, `run-args`, then
    /// `actual-inputs` and `actual-output` when the test uses files.
    pub fn bind(&self, test: &'a TestDefinition) -> Result<Binding<'a>, CompileError> {
        let mut variables = Vec::with_capacity(6);
        let mut actual_inputs = None;

        match test.in_type {
            IoType::Stdio => {
                variables.push(Variable::single(
                    INPUT_FILE,
                    VariableType::RemoteFile,
                    test.input_name(),
                ));
            }
            IoType::File => {
                let (remote, local) = self.input_files(test);
                variables.push(Variable::list(INPUT_FILES, VariableType::RemoteFiles, remote));
                actual_inputs = Some(Variable::list(ACTUAL_INPUTS, VariableType::Files, local));
            }
            IoType::Dir => return Err(unsupported(test, IoDirection::In)),
        }

        let actual_output = match test.out_type {
            IoType::Stdio => None,
            IoType::File => Some(Variable::single(
                ACTUAL_OUTPUT,
                VariableType::File,
                test.declared_out_file()
                    .map(str::to_owned)
                    .unwrap_or_else(|| default_actual_output(test)),
            )),
            IoType::Dir => return Err(unsupported(test, IoDirection::Out)),
        };

        let judge = self.judges.resolve(&test.judge);

        variables.push(Variable::single(
            EXPECTED_OUTPUT,
            VariableType::RemoteFile,
            test.expected_output_name(),
        ));
        variables.push(Variable::single(JUDGE_TYPE, VariableType::String, judge.name()));
        variables.push(Variable::list(
            RUN_ARGS,
            VariableType::Strings,
            test.run_args().to_vec(),
        ));
        variables.extend(actual_inputs);
        variables.extend(actual_output);

        Ok(Binding { variables, judge })
    }

    /// Uploaded inputs of a `file` test, paired with the names they get in
    /// the working directory.
    ///
    /// Every uploaded file in the test's namespace except the reference
    /// output is an input. Local names drop the namespace prefix; the main
    /// input (`{n}.in`) takes the declared input name instead, if any.
    ///
    /// Any other upload named `{n}.something`, such as a judge helper or an
    /// auxiliary data file, becomes an input too.
    fn input_files(&self, test: &TestDefinition) -> (Vec<String>, Vec<String>) {
        let prefix = test.file_prefix();
        let main_input = test.input_name();
        let expected = test.expected_output_name();

        self.files
            .names()
            .filter(|name| name.starts_with(&prefix) && *name != expected)
            .map(|name| {
                let local = match test.declared_in_file() {
                    Some(declared) if name == main_input => declared.to_owned(),
                    _ => name[prefix.len()..].to_owned(),
                };
                (name.to_owned(), local)
            })
            .unzip()
    }
}

fn unsupported(test: &TestDefinition, direction: IoDirection) -> CompileError {
    CompileError::UnsupportedIoMode {
        test: test.name.clone(),
        direction,
    }
}
