//! Choosing build and execution pipelines from the platform's catalog.

use super::{err::PipelineRole, CompileError};
use crate::{
    config::PipelineNames,
    model::{IoDirection, IoType, Pipeline, PipelineCatalog, PipelineParameters, TestDefinition},
};
use std::collections::HashMap;

/// The pipelines available to one runtime environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentPipelines<'c> {
    pub build: Option<&'c Pipeline>,
    pub exec_stdout: Option<&'c Pipeline>,
    pub exec_files: Option<&'c Pipeline>,
}

/// Pipeline choices for a set of environments, computed once per compilation.
///
/// Every choice is the first catalog entry that fits, so the result depends
/// on catalog order and on nothing else.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex<'c> {
    environments: HashMap<String, EnvironmentPipelines<'c>>,
}

impl<'c> CatalogIndex<'c> {
    pub fn build<'e>(
        catalog: &'c PipelineCatalog,
        names: &PipelineNames,
        environments: impl IntoIterator<Item = &'e str>,
    ) -> CatalogIndex<'c> {
        let mut index: HashMap<String, EnvironmentPipelines<'c>> = HashMap::new();
        for environment in environments {
            if index.contains_key(environment) {
                continue;
            }
            let pipelines = EnvironmentPipelines {
                build: select(catalog, environment, names.build.as_deref(), |p| {
                    p.is_compilation_pipeline
                }),
                exec_stdout: select(catalog, environment, names.exec_stdout.as_deref(), |p| {
                    p.is_execution_pipeline && p.produces_stdout
                }),
                exec_files: select(catalog, environment, names.exec_files.as_deref(), |p| {
                    p.is_execution_pipeline && p.produces_files
                }),
            };
            tracing::debug!(
                %environment,
                build = ?pipelines.build.map(|p| &p.id),
                exec_stdout = ?pipelines.exec_stdout.map(|p| &p.id),
                exec_files = ?pipelines.exec_files.map(|p| &p.id),
                "Indexed pipelines"
            );
            index.insert(environment.to_owned(), pipelines);
        }
        CatalogIndex {
            environments: index,
        }
    }

    /// Pipelines of `environment`. Environments left out of the index have none.
    pub fn get(&self, environment: &str) -> EnvironmentPipelines<'c> {
        self.environments
            .get(environment)
            .copied()
            .unwrap_or_default()
    }
}

/// First pipeline supporting `environment` that either carries the pinned
/// name or, with nothing pinned, has the wanted capabilities.
fn select<'c>(
    catalog: &'c PipelineCatalog,
    environment: &str,
    pinned_name: Option<&str>,
    capable: impl Fn(&PipelineParameters) -> bool,
) -> Option<&'c Pipeline> {
    match pinned_name {
        Some(name) => catalog.first_where(|p| p.name == name && p.supports(environment)),
        None => catalog.first_where(|p| capable(&p.parameters) && p.supports(environment)),
    }
}

/// The two pipelines every compiled test runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPipelines<'c> {
    pub build: &'c Pipeline,
    pub exec: &'c Pipeline,
}

/// Pick the build and execution pipelines of `test` in `environment`.
///
/// The execution pipeline has to produce what the test checks: standard
/// output for `stdio` tests, files for `file` tests.
pub fn resolve_pipelines<'c>(
    environment: &str,
    test: &TestDefinition,
    index: &CatalogIndex<'c>,
) -> Result<ResolvedPipelines<'c>, CompileError> {
    let available = index.get(environment);
    let missing = |role| CompileError::MissingPipeline {
        test: test.name.clone(),
        environment: environment.to_owned(),
        role,
    };

    let build = available.build.ok_or_else(|| missing(PipelineRole::Build))?;
    let exec = match test.out_type {
        IoType::Stdio => available
            .exec_stdout
            .ok_or_else(|| missing(PipelineRole::ExecStdout))?,
        IoType::File => available
            .exec_files
            .ok_or_else(|| missing(PipelineRole::ExecFiles))?,
        IoType::Dir => {
            return Err(CompileError::UnsupportedIoMode {
                test: test.name.clone(),
                direction: IoDirection::Out,
            })
        }
    };

    Ok(ResolvedPipelines { build, exec })
}

/// Resolve a single test against a catalog, matching by capabilities only.
///
/// Compiling many tests should build one [`CatalogIndex`] instead.
pub fn resolve<'c>(
    environment: &str,
    test: &TestDefinition,
    catalog: &'c PipelineCatalog,
) -> Result<ResolvedPipelines<'c>, CompileError> {
    let index = CatalogIndex::build(catalog, &PipelineNames::default(), [environment]);
    resolve_pipelines(environment, test, &index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::util::{build_pipeline, exec_pipeline, file_test, stdio_test};
    use pretty_assertions::assert_eq;

    #[test]
    fn first_match_wins() {
        let catalog = PipelineCatalog::new(vec![
            exec_pipeline("exec-other", &["java8"], true, false),
            build_pipeline("build-a", &["cxx11-gcc-linux"]),
            build_pipeline("build-b", &["cxx11-gcc-linux"]),
            exec_pipeline("exec-a", &["cxx11-gcc-linux"], true, false),
            exec_pipeline("exec-b", &["cxx11-gcc-linux"], true, true),
        ]);
        let res = resolve("cxx11-gcc-linux", &stdio_test(1), &catalog).unwrap();
        assert_eq!(res.build.id, "build-a");
        assert_eq!(res.exec.id, "exec-a");
    }

    #[test]
    fn exec_follows_output_type() {
        let catalog = PipelineCatalog::new(vec![
            build_pipeline("build", &["c-gcc-linux"]),
            exec_pipeline("stdout", &["c-gcc-linux"], true, false),
            exec_pipeline("files", &["c-gcc-linux"], false, true),
        ]);
        let res = resolve("c-gcc-linux", &file_test(2), &catalog).unwrap();
        assert_eq!(res.exec.id, "files");
        let res = resolve("c-gcc-linux", &stdio_test(2), &catalog).unwrap();
        assert_eq!(res.exec.id, "stdout");
    }

    #[test]
    fn environment_must_match() {
        let catalog = PipelineCatalog::new(vec![
            build_pipeline("build", &["java8"]),
            exec_pipeline("stdout", &["java8"], true, false),
        ]);
        let err = resolve("mono46", &stdio_test(1), &catalog).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingPipeline {
                test: stdio_test(1).name,
                environment: "mono46".into(),
                role: PipelineRole::Build,
            }
        );
    }

    #[test]
    fn missing_exec_pipeline() {
        let catalog = PipelineCatalog::new(vec![
            build_pipeline("build", &["java8"]),
            exec_pipeline("stdout", &["java8"], true, false),
        ]);
        let err = resolve("java8", &file_test(1), &catalog).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingPipeline {
                role: PipelineRole::ExecFiles,
                ..
            }
        ));
    }

    #[test]
    fn dir_output_rejected() {
        let catalog = PipelineCatalog::new(vec![
            build_pipeline("build", &["java8"]),
            exec_pipeline("files", &["java8"], true, true),
        ]);
        let mut t = file_test(5);
        t.out_type = IoType::Dir;
        assert!(matches!(
            resolve("java8", &t, &catalog),
            Err(CompileError::UnsupportedIoMode {
                direction: IoDirection::Out,
                ..
            })
        ));
    }

    #[test]
    fn pinned_names_take_precedence() {
        let mut pinned = build_pipeline("build-pinned", &["java8"]);
        pinned.name = "Java compilation v2".into();
        let catalog = PipelineCatalog::new(vec![
            build_pipeline("build-first", &["java8"]),
            pinned,
            exec_pipeline("stdout", &["java8"], true, false),
        ]);
        let names = PipelineNames {
            build: Some("Java compilation v2".into()),
            ..Default::default()
        };
        let index = CatalogIndex::build(&catalog, &names, ["java8"]);
        let res = resolve_pipelines("java8", &stdio_test(1), &index).unwrap();
        assert_eq!(res.build.id, "build-pinned");
        assert_eq!(res.exec.id, "stdout");
    }

    #[test]
    fn unindexed_environment_has_nothing() {
        let catalog = PipelineCatalog::new(vec![build_pipeline("build", &["java8"])]);
        let index = CatalogIndex::build(&catalog, &PipelineNames::default(), ["java8"]);
        assert_eq!(index.get("mono46"), EnvironmentPipelines::default());
        assert!(index.get("java8").build.is_some());
    }
}
