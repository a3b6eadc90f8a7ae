use super::CompileError;
use crate::model::{Limits, TestDefinition, DEFAULT_LIMITS_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Limits of `test` when solved in a language with the given extension.
///
/// The extension-specific entry wins over `default`. Values are not
/// converted in any way.
pub fn resolve_limits<'a>(
    test: &'a TestDefinition,
    extension: &str,
) -> Result<&'a Limits, CompileError> {
    test.limits
        .get(extension)
        .or_else(|| test.limits.get(DEFAULT_LIMITS_KEY))
        .ok_or_else(|| CompileError::MissingLimits {
            test: test.name.clone(),
            extension: extension.to_owned(),
        })
}

/// Limits of one test as the grading platform takes them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TestLimits {
    pub wall_time: String,
    pub memory: String,
}

impl From<&Limits> for TestLimits {
    fn from(limits: &Limits) -> Self {
        TestLimits {
            wall_time: limits.time_limit.clone(),
            memory: limits.mem_limit.clone(),
        }
    }
}

/// Test name to limits, for every test in one environment.
pub type LimitsConfig = BTreeMap<String, TestLimits>;

/// Build the limits table of one environment.
///
/// Tests without usable limits are left out and their errors returned next
/// to the table.
pub fn limits_config<'a>(
    tests: impl IntoIterator<Item = &'a TestDefinition>,
    extension: &str,
) -> (LimitsConfig, Vec<CompileError>) {
    let mut config = LimitsConfig::new();
    let mut errors = vec![];
    for test in tests {
        match resolve_limits(test, extension) {
            Ok(limits) => {
                config.insert(test.name.clone(), limits.into());
            }
            Err(e) => errors.push(e),
        }
    }
    (config, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::util::stdio_test;
    use pretty_assertions::assert_eq;

    fn with_limits(entries: &[(&str, &str, &str)]) -> TestDefinition {
        let mut t = stdio_test(1);
        t.limits = entries
            .iter()
            .map(|&(key, time, mem)| (key.to_owned(), Limits::new(time, mem)))
            .collect();
        t
    }

    #[test]
    fn extension_before_default() {
        let t = with_limits(&[("cpp", "2", "1024"), ("default", "5", "2048")]);
        assert_eq!(resolve_limits(&t, "cpp").unwrap(), &Limits::new("2", "1024"));
        assert_eq!(resolve_limits(&t, "java").unwrap(), &Limits::new("5", "2048"));
    }

    #[test]
    fn missing_limits_name_the_test() {
        let t = with_limits(&[("cpp", "2", "1024")]);
        assert_eq!(
            resolve_limits(&t, "java"),
            Err(CompileError::MissingLimits {
                test: t.name.clone(),
                extension: "java".into()
            })
        );
    }

    #[test]
    fn values_pass_verbatim() {
        let t = with_limits(&[("default", "0.500", "65536")]);
        let limits = resolve_limits(&t, "c").unwrap();
        assert_eq!(limits.time_limit, "0.500");
    }

    #[test]
    fn config_skips_broken_tests() {
        let good = with_limits(&[("default", "1", "100")]);
        let mut bad = with_limits(&[]);
        bad.name = "broken".into();

        let (config, errors) = limits_config(&[good.clone(), bad], "cpp");
        assert_eq!(config.len(), 1);
        assert_eq!(
            config[&good.name],
            TestLimits {
                wall_time: "1".into(),
                memory: "100".into()
            }
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].test(), Some("broken"));
        assert_eq!(
            serde_json::to_value(&config[&good.name]).unwrap(),
            serde_json::json!({"wall-time": "1", "memory": "100"})
        );
    }
}
