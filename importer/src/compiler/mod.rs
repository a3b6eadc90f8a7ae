//! Compiling legacy test definitions into an exercise configuration of the
//! grading platform.
//!
//! A test that cannot be compiled for an environment is left out of that
//! environment and its error recorded; everything else still compiles. See
//! [`Compilation`] for what comes out of a pass.

pub mod binder;
mod err;
pub mod limits;
pub mod resolver;

pub use binder::{Binding, VariableBinder};
pub use err::{CompileError, Diagnostic, PipelineRole};
pub use limits::{limits_config, resolve_limits, LimitsConfig, TestLimits};
pub use resolver::{resolve, resolve_pipelines, CatalogIndex, ResolvedPipelines};

use crate::{
    config::ImportConfig,
    model::{
        EnvironmentBlock, ExecutionPlan, ExerciseTest, FileIndex, PipelineCatalog, PipelineStep,
        TestDefinition, TestPlan,
    },
};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Everything produced by one compilation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compilation {
    pub plan: ExecutionPlan,
    /// Environment id to the limits of every test compiled in it.
    pub limits: BTreeMap<String, LimitsConfig>,
    /// Tests (or whole environments) left out, in the order they were met.
    pub errors: Vec<CompileError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Whether every test compiled in every environment.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log a summary of the pass.
    pub fn log_summary(&self) {
        tracing::info!(
            environments = self.plan.environments.len(),
            compiled = self.plan.test_count(),
            failed = self.errors.len(),
            warnings = self.diagnostics.len(),
            "Compilation finished"
        );
        for diagnostic in &self.diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        for error in &self.errors {
            tracing::error!("{}", error);
        }
    }
}

/// Compiles test definitions into an [`ExecutionPlan`].
///
/// The compiler keeps no state between passes: compiling the same input
/// twice gives the same result.
#[derive(Debug, Clone)]
pub struct PlanCompiler<'a> {
    config: &'a ImportConfig,
    test_ids: Option<HashMap<&'a str, &'a str>>,
}

impl<'a> PlanCompiler<'a> {
    pub fn new(config: &'a ImportConfig) -> PlanCompiler<'a> {
        PlanCompiler {
            config,
            test_ids: None,
        }
    }

    /// Name compiled tests by their remote ids instead of their names.
    ///
    /// Later entries win when a name is listed twice.
    pub fn with_test_ids(mut self, tests: &'a [ExerciseTest]) -> PlanCompiler<'a> {
        self.test_ids = Some(
            tests
                .iter()
                .map(|t| (t.name.as_str(), t.id.as_str()))
                .collect(),
        );
        self
    }

    /// Compile `tests` for every extension in `extensions`.
    ///
    /// Environments come out in the order of `extensions`, tests in the order
    /// of `tests`.
    pub fn compile(
        &self,
        tests: &[TestDefinition],
        catalog: &PipelineCatalog,
        extensions: &[String],
        files: &FileIndex,
    ) -> Compilation {
        let mut res = Compilation {
            diagnostics: self.check_names(tests, catalog),
            ..Default::default()
        };

        let environments = extensions
            .iter()
            .filter_map(|ext| match self.config.environment_for(ext) {
                Some(env) => Some((ext.as_str(), env)),
                None => {
                    tracing::warn!(extension = %ext, "No runtime environment for extension");
                    res.errors.push(CompileError::UnknownExtension {
                        extension: ext.clone(),
                    });
                    None
                }
            })
            .collect_vec();

        let index = CatalogIndex::build(
            catalog,
            &self.config.pipelines,
            environments.iter().map(|&(_, env)| env),
        );
        let binder = VariableBinder::new(&self.config.judges, files);
        let mut judge_reported = HashSet::new();

        for &(extension, environment) in &environments {
            tracing::debug!(%extension, %environment, "Compiling environment");
            let mut block = EnvironmentBlock {
                name: environment.to_owned(),
                tests: Vec::with_capacity(tests.len()),
            };
            let mut env_limits = LimitsConfig::new();

            for test in tests {
                let compiled = resolve_pipelines(environment, test, &index).and_then(|pipelines| {
                    let binding = binder.bind(test)?;
                    let limits = resolve_limits(test, extension)?;
                    Ok((pipelines, binding, limits))
                });

                let (pipelines, binding, limits) = match compiled {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(%environment, test = %test.name, "Skipping test: {}", e);
                        res.errors.push(e);
                        continue;
                    }
                };

                if !binding.judge.is_mapped() && judge_reported.insert(test.name.as_str()) {
                    res.diagnostics.push(Diagnostic::UnmappedJudge {
                        test: test.name.clone(),
                        judge: test.judge.clone(),
                    });
                }

                tracing::trace!(
                    %environment,
                    test = %test.name,
                    build = %pipelines.build.id,
                    exec = %pipelines.exec.id,
                    "Compiled test"
                );
                block.tests.push(TestPlan {
                    name: self.plan_name(test, &mut res.diagnostics),
                    pipelines: vec![
                        PipelineStep {
                            name: pipelines.build.id.clone(),
                            variables: vec![],
                        },
                        PipelineStep {
                            name: pipelines.exec.id.clone(),
                            variables: binding.variables,
                        },
                    ],
                });
                env_limits.insert(test.name.clone(), limits.into());
            }

            res.limits.insert(environment.to_owned(), env_limits);
            res.plan.environments.push(block);
        }

        res
    }

    /// Remote id of `test`, or its name when there is no id to use.
    fn plan_name(&self, test: &TestDefinition, diagnostics: &mut Vec<Diagnostic>) -> String {
        let ids = match &self.test_ids {
            Some(ids) => ids,
            None => return test.name.clone(),
        };
        match ids.get(test.name.as_str()) {
            Some(id) => (*id).to_owned(),
            None => {
                let missing = Diagnostic::MissingTestId {
                    name: test.name.clone(),
                };
                if !diagnostics.contains(&missing) {
                    diagnostics.push(missing);
                }
                test.name.clone()
            }
        }
    }

    /// Report names that make the result ambiguous.
    fn check_names(&self, tests: &[TestDefinition], catalog: &PipelineCatalog) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];

        let mut seen = HashSet::new();
        for test in tests {
            if !seen.insert(test.name.as_str()) {
                diagnostics.push(Diagnostic::DuplicateTestName {
                    name: test.name.clone(),
                });
            }
        }

        let pinned = &self.config.pipelines;
        let pinned = [&pinned.build, &pinned.exec_stdout, &pinned.exec_files];
        for name in catalog.duplicate_names() {
            if pinned.iter().any(|p| p.as_deref() == Some(name)) {
                diagnostics.push(Diagnostic::DuplicatePipelineName {
                    name: name.to_owned(),
                });
            }
        }

        diagnostics.into_iter().unique().collect()
    }
}
