//! Exercise-level facts gathered from the test list, outside of any plan.

use crate::model::{IoDirection, TestDefinition};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score configuration of the grading platform: test name to its weight.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreConfig {
    pub test_weights: BTreeMap<String, u32>,
}

impl ScoreConfig {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

pub fn score_config(tests: &[TestDefinition]) -> ScoreConfig {
    ScoreConfig {
        test_weights: tests.iter().map(|t| (t.name.clone(), t.points)).collect(),
    }
}

/// Custom judge binaries to upload with the exercise, each listed once, in
/// the order tests first mention them.
pub fn custom_judges(tests: &[TestDefinition]) -> Vec<&str> {
    tests
        .iter()
        .filter_map(TestDefinition::custom_judge)
        .unique()
        .collect()
}

/// A test side using `dir` I/O. These tests need manual attention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirUsage<'a> {
    pub test: &'a TestDefinition,
    pub direction: IoDirection,
}

pub fn dir_tests(tests: &[TestDefinition]) -> Vec<DirUsage<'_>> {
    tests
        .iter()
        .flat_map(|test| {
            test.dir_directions()
                .map(move |direction| DirUsage { test, direction })
        })
        .collect()
}
