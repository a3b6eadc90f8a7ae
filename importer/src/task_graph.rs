//! Rendering a legacy test straight into a sandboxed task chain, for backends
//! that run tasks locally instead of through pipelines.

use crate::{
    compiler::{resolve_limits, CompileError},
    config::JudgeAliases,
    model::{
        BoundDirectory, IoType, MountMode, Sandbox, SandboxLimits, Task, TaskCommand,
        TaskGraph, TestDefinition,
    },
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Fixed parts of every emitted task chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[serde(default)]
#[builder(setter(into), default)]
pub struct TaskGraphOptions {
    /// Hardware group the sandbox limits apply to.
    pub hw_group_id: String,
    /// Time limit of judge tasks, independent of the test's own limits.
    pub judge_time: String,
    /// Memory limit of judge tasks.
    pub judge_memory: String,
    /// The compiled program.
    pub program: String,
    pub judges_dir: String,
    /// Judge stripping comments from the program output before comparison.
    pub filter_judge: String,
    pub source_dir: String,
    pub eval_dir: String,
    /// `PATH` inside the sandbox.
    pub path_env: String,
    /// Mark every task fatal, so a failure stops the rest of the chain.
    pub fatal_failures: bool,
}

impl Default for TaskGraphOptions {
    fn default() -> Self {
        TaskGraphOptions {
            hw_group_id: "group1".into(),
            judge_time: "2.0".into(),
            judge_memory: "16384".into(),
            program: "a.out".into(),
            judges_dir: "${JUDGES_DIR}".into(),
            filter_judge: "recodex-judge-filter".into(),
            source_dir: "${SOURCE_DIR}".into(),
            eval_dir: "${EVAL_DIR}".into(),
            path_env: "/usr/bin".into(),
            fatal_failures: false,
        }
    }
}

/// Input file name used when a test declares none.
pub fn default_input_file(test: &TestDefinition) -> String {
    format!("{}.stdin", test.number)
}

/// Output file name used when a test declares none.
pub fn default_output_file(test: &TestDefinition) -> String {
    format!("{}.stdout", test.number)
}

pub struct TaskGraphEmitter<'a> {
    options: &'a TaskGraphOptions,
    judges: &'a JudgeAliases,
}

impl<'a> TaskGraphEmitter<'a> {
    pub fn new(options: &'a TaskGraphOptions, judges: &'a JudgeAliases) -> TaskGraphEmitter<'a> {
        TaskGraphEmitter { options, judges }
    }

    /// Emit the task chain of one test, numbering priorities from
    /// `base_priority` on.
    ///
    /// The chain fetches the input, runs the program, fetches the reference
    /// output, filters the program output, judges it, and removes what was
    /// left behind. Each task depends on the one before it.
    pub fn emit(
        &self,
        test: &TestDefinition,
        extension: &str,
        base_priority: u32,
    ) -> Result<TaskGraph, CompileError> {
        if let Some(direction) = test.dir_directions().next() {
            return Err(CompileError::UnsupportedIoMode {
                test: test.name.clone(),
                direction,
            });
        }
        let limits = resolve_limits(test, extension)?;
        if base_priority.checked_add(STAGES - 1).is_none() {
            return Err(CompileError::PriorityOverflow {
                test: test.name.clone(),
            });
        }

        let opt = self.options;
        let n = test.number;
        let src = |name: &str| format!("{}/{}", opt.source_dir, name);
        let in_file = test
            .declared_in_file()
            .map(str::to_owned)
            .unwrap_or_else(|| default_input_file(test));
        let out_file = test
            .declared_out_file()
            .map(str::to_owned)
            .unwrap_or_else(|| default_output_file(test));
        let filtered = format!("{}_filtered", out_file);
        let expected = test.expected_output_name();

        let mut chain = Chain::new(base_priority, opt.fatal_failures);

        chain.push(
            format!("fetch_input_{}", n),
            command("fetch", [test.input_name(), src(&in_file)]),
        );

        let eval = chain.push(
            format!("eval_task_{}", n),
            command(&opt.program, test.run_args().iter().cloned()),
        );
        if test.in_type == IoType::Stdio {
            eval.stdin = Some(in_file.clone());
        }
        if test.out_type == IoType::Stdio {
            eval.stdout = Some(out_file.clone());
        }
        eval.sandbox = Some(self.sandbox(&limits.time_limit, &limits.mem_limit));

        chain.push(
            format!("fetch_output_{}", n),
            command("fetch", [expected.clone(), src(&expected)]),
        );

        let filter = chain.push(
            format!("judge_filter_{}", n),
            command(
                &format!("{}/{}", opt.judges_dir, opt.filter_judge),
                [out_file.clone(), filtered.clone()],
            ),
        );
        filter.sandbox = Some(self.judge_sandbox());

        let judge = chain.push(
            format!("judge_test_{}", n),
            command(&self.judge_binary(test), [expected.clone(), filtered.clone()]),
        );
        judge.sandbox = Some(self.judge_sandbox());

        chain.push(
            format!("remove_junk_{}", n),
            command(
                "rm",
                [src(&expected), src(&in_file), src(&out_file), src(&filtered)],
            ),
        );

        Ok(chain.finish())
    }

    /// Emit the chains of all tests one after another, with one continuous
    /// priority sequence. Tests that fail to emit are left out.
    pub fn emit_all(
        &self,
        tests: &[TestDefinition],
        extension: &str,
        base_priority: u32,
    ) -> (TaskGraph, Vec<CompileError>) {
        let mut graph = TaskGraph::default();
        let mut errors = vec![];
        // `None` once the last emitted task sits at `u32::MAX`
        let mut next_priority = Some(base_priority);
        for test in tests {
            let emitted = match next_priority {
                Some(base) => self.emit(test, extension, base),
                None => Err(CompileError::PriorityOverflow {
                    test: test.name.clone(),
                }),
            };
            match emitted {
                Ok(chain) => {
                    if let Some(last) = chain.tasks.last() {
                        next_priority = last.priority.checked_add(1);
                    }
                    graph.extend(chain);
                }
                Err(e) => {
                    tracing::warn!(test = %test.name, "Skipping test: {}", e);
                    errors.push(e);
                }
            }
        }
        (graph, errors)
    }

    /// The judge comparing outputs. Custom judges are shipped with the
    /// exercise files; everything else comes from the judges directory.
    fn judge_binary(&self, test: &TestDefinition) -> String {
        if let Some(custom) = test.custom_judge() {
            let file_name = custom.rsplit('/').next().unwrap_or(custom);
            return format!("{}/{}", self.options.source_dir, file_name);
        }
        let judge = self.judges.resolve(&test.judge);
        if !judge.is_mapped() {
            tracing::warn!(test = %test.name, judge = %test.judge, "Judge has no alias, used as is");
        }
        format!("{}/{}", self.options.judges_dir, judge.name())
    }

    fn judge_sandbox(&self) -> Sandbox {
        self.sandbox(&self.options.judge_time, &self.options.judge_memory)
    }

    fn sandbox(&self, time: &str, memory: &str) -> Sandbox {
        let opt = self.options;
        Sandbox {
            name: "isolate".into(),
            limits: vec![SandboxLimits {
                hw_group_id: opt.hw_group_id.clone(),
                time: time.into(),
                memory: memory.into(),
                chdir: opt.eval_dir.clone(),
                environ_variable: [("PATH".to_owned(), opt.path_env.clone())]
                    .into_iter()
                    .collect(),
                bound_directories: vec![BoundDirectory {
                    src: opt.source_dir.clone(),
                    dst: opt.eval_dir.clone(),
                    mode: MountMode::ReadWrite,
                }],
            }],
        }
    }
}

fn command<S: Into<String>>(bin: &str, args: impl IntoIterator<Item = S>) -> TaskCommand {
    TaskCommand {
        bin: bin.to_owned(),
        args: args.into_iter().map(Into::into).collect(),
    }
}

/// Number of tasks emitted per test.
const STAGES: u32 = 6;

/// A linear run of tasks, each depending on the previous one.
///
/// Holds at most [`STAGES`] tasks; the caller checks that their priorities
/// fit in `u32`.
struct Chain {
    tasks: Vec<Task>,
    base_priority: u32,
    fatal: bool,
}

impl Chain {
    fn new(base_priority: u32, fatal: bool) -> Chain {
        Chain {
            tasks: Vec::with_capacity(STAGES as usize),
            base_priority,
            fatal,
        }
    }

    fn push(&mut self, task_id: String, cmd: TaskCommand) -> &mut Task {
        let dependencies = self.tasks.last().map(|t| t.task_id.clone()).into_iter().collect();
        self.tasks.push(Task {
            task_id,
            priority: self.base_priority + self.tasks.len() as u32,
            fatal_failure: self.fatal,
            dependencies,
            cmd,
            stdin: None,
            stdout: None,
            sandbox: None,
        });
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    fn finish(self) -> TaskGraph {
        TaskGraph { tasks: self.tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::IoDirection,
        test::util::{file_test, stdio_test},
    };
    use pretty_assertions::assert_eq;

    fn emit(test: &TestDefinition, base: u32) -> Result<TaskGraph, CompileError> {
        let options = TaskGraphOptions::default();
        let judges = JudgeAliases::default();
        TaskGraphEmitter::new(&options, &judges).emit(test, "cpp", base)
    }

    #[test]
    fn six_stage_chain() {
        let graph = emit(&stdio_test(3), 1).unwrap();
        let ids: Vec<_> = graph.tasks.iter().map(|t| t.task_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "fetch_input_3",
                "eval_task_3",
                "fetch_output_3",
                "judge_filter_3",
                "judge_test_3",
                "remove_junk_3"
            ]
        );
        assert!(graph.validate().is_empty());
        assert!(graph.tasks.iter().all(|t| !t.fatal_failure));
        assert!(graph.tasks[0].dependencies.is_empty());
        for pair in graph.tasks.windows(2) {
            assert_eq!(pair[1].dependencies, vec![pair[0].task_id.clone()]);
        }
    }

    #[test]
    fn priorities_start_at_base() {
        let graph = emit(&stdio_test(1), 40).unwrap();
        let priorities: Vec<_> = graph.tasks.iter().map(|t| t.priority).collect();
        assert_eq!(priorities, vec![40, 41, 42, 43, 44, 45]);
    }

    #[test]
    fn stdio_redirection_and_limits() {
        let graph = emit(&stdio_test(2), 1).unwrap();
        let eval = graph.task("eval_task_2").unwrap();
        assert_eq!(eval.cmd.bin, "a.out");
        assert_eq!(eval.stdin.as_deref(), Some("2.stdin"));
        assert_eq!(eval.stdout.as_deref(), Some("2.stdout"));
        let limits = &eval.sandbox.as_ref().unwrap().limits[0];
        assert_eq!(limits.time.0, "1");
        assert_eq!(limits.memory.0, "65536");

        let fetch = graph.task("fetch_input_2").unwrap();
        assert_eq!(fetch.cmd.args, vec!["2.in", "${SOURCE_DIR}/2.stdin"]);
        assert!(fetch.sandbox.is_none());
    }

    #[test]
    fn file_io_has_no_redirection() {
        let graph = emit(&file_test(5), 1).unwrap();
        let eval = graph.task("eval_task_5").unwrap();
        assert_eq!(eval.stdin, None);
        assert_eq!(eval.stdout, None);

        let filter = graph.task("judge_filter_5").unwrap();
        assert_eq!(
            filter.cmd.args,
            vec!["out.txt".to_string(), "out.txt_filtered".to_string()]
        );
    }

    #[test]
    fn judges_use_fixed_limits() {
        let mut t = stdio_test(1);
        t.judge = "bin/codex_judge".into();
        let graph = emit(&t, 1).unwrap();
        for id in ["judge_filter_1", "judge_test_1"] {
            let limits = &graph.task(id).unwrap().sandbox.as_ref().unwrap().limits[0];
            assert_eq!(limits.time.0, "2.0");
            assert_eq!(limits.memory.0, "16384");
        }
        let judge = graph.task("judge_test_1").unwrap();
        assert_eq!(judge.cmd.bin, "${JUDGES_DIR}/recodex-judge-normal");
        assert_eq!(judge.cmd.args, vec!["1.out", "1.stdout_filtered"]);
        assert!(graph.task("remove_junk_1").unwrap().sandbox.is_none());
    }

    #[test]
    fn custom_judge_from_sources() {
        let mut t = stdio_test(1);
        t.has_custom_judge = true;
        t.custom_judge_binary = Some("bin/checker".into());
        let graph = emit(&t, 1).unwrap();
        assert_eq!(
            graph.task("judge_test_1").unwrap().cmd.bin,
            "${SOURCE_DIR}/checker"
        );
    }

    #[test]
    fn run_args_reach_program() {
        let mut t = stdio_test(1);
        t.cmd_args = vec!["./$PROBLEM".into(), "--fast".into()];
        let graph = emit(&t, 1).unwrap();
        assert_eq!(graph.task("eval_task_1").unwrap().cmd.args, vec!["--fast"]);
    }

    #[test]
    fn dir_and_limits_errors() {
        let mut t = stdio_test(1);
        t.out_type = IoType::Dir;
        assert!(matches!(
            emit(&t, 1),
            Err(CompileError::UnsupportedIoMode {
                direction: IoDirection::Out,
                ..
            })
        ));

        let mut t = stdio_test(1);
        t.limits.clear();
        assert!(matches!(emit(&t, 1), Err(CompileError::MissingLimits { .. })));
    }

    #[test]
    fn fatal_option() {
        let options = TaskGraphOptionsBuilder::default()
            .fatal_failures(true)
            .build()
            .unwrap();
        let judges = JudgeAliases::default();
        let graph = TaskGraphEmitter::new(&options, &judges)
            .emit(&stdio_test(1), "cpp", 1)
            .unwrap();
        assert!(graph.tasks.iter().all(|t| t.fatal_failure));
        assert_eq!(options.hw_group_id, "group1");
    }

    #[test]
    fn priorities_stop_at_u32_max() {
        let graph = emit(&stdio_test(1), u32::MAX - 5).unwrap();
        assert_eq!(graph.tasks.last().unwrap().priority, u32::MAX);
        assert!(graph.validate().is_empty());

        assert_eq!(
            emit(&stdio_test(1), u32::MAX - 2),
            Err(CompileError::PriorityOverflow { test: "01".into() })
        );
    }
}
