use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(name = "codex-import", version)]
pub struct Opts {
    #[clap(subcommand)]
    pub cmd: SubCmd,

    #[clap(flatten)]
    pub opt: GlobalOpts,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Importer config file. Defaults to `./import-config.toml`, then
    /// `codex-importer/config.toml` in the user config directory.
    #[clap(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log more. Given twice, log everything. Overrides `RUST_LOG`.
    #[clap(long, short, global = true, parse(from_occurrences))]
    pub verbose: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCmd {
    /// Compile the exercise configuration of the grading platform
    #[clap(name = "plan")]
    Plan(PlanSubCmd),

    /// Emit the sandbox task graph of tests for one language
    #[clap(name = "task-graph")]
    TaskGraph(TaskGraphSubCmd),

    /// Print test limits per runtime environment
    #[clap(name = "limits")]
    Limits(LimitsSubCmd),

    /// Print the score configuration built from test points
    #[clap(name = "score-config")]
    ScoreConfig(InputOpts),

    /// List tests using directory I/O, which cannot be imported
    #[clap(name = "dir-tests")]
    DirTests(InputOpts),

    /// List custom judge binaries that need uploading
    #[clap(name = "custom-judges")]
    CustomJudges(InputOpts),
}

#[derive(Args, Debug, Clone)]
pub struct InputOpts {
    /// Test definitions, as JSON, YAML or TOML depending on the extension.
    #[clap(name = "tests-path")]
    pub tests: PathBuf,

    /// Write the result here instead of standard output.
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PlanSubCmd {
    #[clap(flatten)]
    pub input: InputOpts,

    /// Pipeline listing of the grading platform.
    #[clap(long, required = true)]
    pub catalog: PathBuf,

    /// Listing of files uploaded to the exercise. Without it, `file` tests
    /// get no input files.
    #[clap(long)]
    pub files: Option<PathBuf>,

    /// Remote tests of the exercise. Compiled tests are named by their ids.
    #[clap(long)]
    pub test_ids: Option<PathBuf>,

    /// Source file extensions to compile for, e.g. `--ext c,cpp,java`.
    #[clap(long, required = true, use_delimiter = true)]
    pub ext: Vec<String>,

    /// Succeed even if some tests could not be compiled.
    #[clap(long)]
    pub allow_partial: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TaskGraphSubCmd {
    #[clap(flatten)]
    pub input: InputOpts,

    /// Source file extension the limits are taken for.
    #[clap(long, required = true)]
    pub ext: String,

    /// Only emit the test with this number.
    #[clap(long)]
    pub test: Option<u32>,

    /// Priority of the first task.
    #[clap(long, default_value = "1")]
    pub base_priority: u32,

    /// Stop evaluation at the first failing task.
    #[clap(long)]
    pub fatal: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LimitsSubCmd {
    #[clap(flatten)]
    pub input: InputOpts,

    /// Source file extensions to print limits for.
    #[clap(long, required = true, use_delimiter = true)]
    pub ext: Vec<String>,
}
