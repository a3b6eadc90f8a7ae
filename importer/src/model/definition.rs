use crate::util::{single_or_array, string_or_number};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The token marking the evaluated program inside a legacy command line.
pub const PROGRAM_SENTINEL: &str = "./$PROBLEM";

/// The limits key used when no extension-specific entry exists.
pub const DEFAULT_LIMITS_KEY: &str = "default";

/// How a test feeds its input to, or collects its output from, the program.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IoType {
    /// Standard input or standard output.
    Stdio,
    /// One or more named files in the working directory.
    File,
    /// A whole directory. Legacy configs declare it but nothing can run it.
    Dir,
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoType::Stdio => f.write_str("stdio"),
            IoType::File => f.write_str("file"),
            IoType::Dir => f.write_str("dir"),
        }
    }
}

/// Which side of a test an I/O type belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IoDirection {
    In,
    Out,
}

impl fmt::Display for IoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoDirection::In => f.write_str("in"),
            IoDirection::Out => f.write_str("out"),
        }
    }
}

/// Resource limits of one test, kept in the textual form the sandbox expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// Wall time, in seconds.
    #[serde(alias = "time", deserialize_with = "string_or_number")]
    pub time_limit: String,
    /// Memory, in kilobytes.
    #[serde(alias = "memory", alias = "mem", deserialize_with = "string_or_number")]
    pub mem_limit: String,
}

impl Limits {
    pub fn new(time_limit: impl Into<String>, mem_limit: impl Into<String>) -> Limits {
        Limits {
            time_limit: time_limit.into(),
            mem_limit: mem_limit.into(),
        }
    }
}

/// Limits keyed by source file extension, or by [`DEFAULT_LIMITS_KEY`].
pub type LimitsTable = BTreeMap<String, Limits>;

/// One test of a legacy exercise, as normalized by the legacy config parser.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    /// Ordinal of the test. Namespaces the test's data files (`3.in`, `3.out`).
    pub number: u32,
    /// Display name, unique within an exercise.
    pub name: String,
    pub in_type: IoType,
    pub out_type: IoType,
    /// Local name of the input file, if the test declares one.
    #[serde(default)]
    pub in_file: Option<String>,
    /// Local name of the output file, if the test declares one.
    #[serde(default)]
    pub out_file: Option<String>,
    /// Judge identifier, resolved through the configured alias table.
    pub judge: String,
    /// The legacy command line, see [`PROGRAM_SENTINEL`].
    #[serde(default, deserialize_with = "single_or_array")]
    pub cmd_args: Vec<String>,
    #[serde(default)]
    pub limits: LimitsTable,
    #[serde(default)]
    pub has_custom_judge: bool,
    /// Path of the custom judge, relative to the exercise's test data.
    #[serde(default)]
    pub custom_judge_binary: Option<String>,
    /// Weight of this test in the exercise score.
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    100
}

impl TestDefinition {
    /// Arguments passed to the evaluated program: every token after the
    /// program sentinel, or nothing if the sentinel is missing.
    pub fn run_args(&self) -> &[String] {
        match self.cmd_args.iter().position(|arg| arg == PROGRAM_SENTINEL) {
            Some(idx) => &self.cmd_args[idx + 1..],
            None => &[],
        }
    }

    /// Prefix shared by all data files of this test, e.g. `3.`.
    pub fn file_prefix(&self) -> String {
        format!("{}.", self.number)
    }

    /// Name of the uploaded input file, e.g. `3.in`.
    pub fn input_name(&self) -> String {
        format!("{}.in", self.number)
    }

    /// Name of the uploaded reference output, e.g. `3.out`.
    pub fn expected_output_name(&self) -> String {
        format!("{}.out", self.number)
    }

    /// The declared input file name. Empty names count as undeclared.
    pub fn declared_in_file(&self) -> Option<&str> {
        self.in_file.as_deref().filter(|name| !name.is_empty())
    }

    /// The declared output file name. Empty names count as undeclared.
    pub fn declared_out_file(&self) -> Option<&str> {
        self.out_file.as_deref().filter(|name| !name.is_empty())
    }

    /// Sides of this test that use `dir` I/O.
    pub fn dir_directions(&self) -> impl Iterator<Item = IoDirection> {
        let input = (self.in_type == IoType::Dir).then(|| IoDirection::In);
        let output = (self.out_type == IoType::Dir).then(|| IoDirection::Out);
        input.into_iter().chain(output)
    }

    /// The custom judge binary to upload, if this test needs one.
    pub fn custom_judge(&self) -> Option<&str> {
        if self.has_custom_judge {
            self.custom_judge_binary.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_args(args: &[&str]) -> TestDefinition {
        TestDefinition {
            number: 1,
            name: "01".into(),
            in_type: IoType::Stdio,
            out_type: IoType::Stdio,
            in_file: None,
            out_file: None,
            judge: "diff".into(),
            cmd_args: args.iter().map(|s| s.to_string()).collect(),
            limits: LimitsTable::new(),
            has_custom_judge: false,
            custom_judge_binary: None,
            points: 100,
        }
    }

    #[test]
    fn run_args_follow_sentinel() {
        let t = with_args(&["./$PROBLEM", "-x", "5"]);
        assert_eq!(t.run_args(), &["-x".to_string(), "5".to_string()]);
    }

    #[test]
    fn run_args_drop_prefix() {
        let t = with_args(&["timeout", "10", "./$PROBLEM", "input.txt"]);
        assert_eq!(t.run_args(), &["input.txt".to_string()]);
    }

    #[test]
    fn run_args_without_sentinel() {
        assert!(with_args(&["foo"]).run_args().is_empty());
        assert!(with_args(&[]).run_args().is_empty());
        assert!(with_args(&["./$PROBLEM"]).run_args().is_empty());
    }

    #[test]
    fn empty_file_names_are_undeclared() {
        let mut t = with_args(&[]);
        t.in_file = Some("".into());
        t.out_file = Some("result.txt".into());
        assert_eq!(t.declared_in_file(), None);
        assert_eq!(t.declared_out_file(), Some("result.txt"));
    }

    #[test]
    fn deserialize_legacy_record() {
        let t: TestDefinition = serde_json::from_str(
            r#"{
                "number": 3,
                "name": "Test 03",
                "inType": "file",
                "outType": "stdio",
                "inFile": "data.txt",
                "judge": "bin/codex_judge",
                "cmdArgs": ["./$PROBLEM", "data.txt"],
                "limits": {
                    "default": {"timeLimit": 2.0, "memLimit": 65536},
                    "java": {"timeLimit": "5", "memLimit": "262144"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(t.in_type, IoType::File);
        assert_eq!(t.out_file, None);
        assert_eq!(t.points, 100);
        assert!(!t.has_custom_judge);
        assert_eq!(t.limits["default"], Limits::new("2.0", "65536"));
        assert_eq!(t.limits["java"], Limits::new("5", "262144"));
    }

    #[test]
    fn dir_directions_are_listed() {
        let mut t = with_args(&[]);
        assert_eq!(t.dir_directions().count(), 0);
        t.in_type = IoType::Dir;
        t.out_type = IoType::Dir;
        assert_eq!(
            t.dir_directions().collect::<Vec<_>>(),
            vec![IoDirection::In, IoDirection::Out]
        );
    }
}
