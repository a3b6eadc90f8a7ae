use anyhow::{bail, Context, Result};
use clap::Parser;
use codex_importer::{
    compiler::{limits_config, LimitsConfig, PlanCompiler},
    config::ImportConfig,
    exercise,
    model::{ExerciseTest, FileIndex, PipelineCatalog, TestDefinition},
    task_graph::TaskGraphEmitter,
    util::load_document,
};
use serde::de::DeserializeOwned;
use std::{
    collections::BTreeMap,
    io::Write,
    path::Path,
};
use tracing_subscriber::{prelude::*, EnvFilter};

mod opt;

fn main() -> Result<()> {
    let opt = opt::Opts::parse();
    init_logging(opt.opt.verbose);

    let config = ImportConfig::discover(opt.opt.config.as_deref())
        .context("Failed to load importer config")?;

    match opt.cmd {
        opt::SubCmd::Plan(cmd) => plan(cmd, &config),
        opt::SubCmd::TaskGraph(cmd) => task_graph(cmd, &config),
        opt::SubCmd::Limits(cmd) => limits(cmd, &config),
        opt::SubCmd::ScoreConfig(cmd) => {
            let tests = read_tests(&cmd.tests)?;
            let yaml = exercise::score_config(&tests).to_yaml()?;
            write_output(cmd.output.as_deref(), &yaml)
        }
        opt::SubCmd::DirTests(cmd) => {
            let tests = read_tests(&cmd.tests)?;
            let lines = exercise::dir_tests(&tests)
                .iter()
                .map(|usage| format!("{} {}\n", usage.test.number, usage.direction))
                .collect::<String>();
            write_output(cmd.output.as_deref(), &lines)
        }
        opt::SubCmd::CustomJudges(cmd) => {
            let tests = read_tests(&cmd.tests)?;
            let lines = exercise::custom_judges(&tests)
                .iter()
                .map(|judge| format!("{}\n", judge))
                .collect::<String>();
            write_output(cmd.output.as_deref(), &lines)
        }
    }
}

fn init_logging(verbose: u64) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn plan(cmd: opt::PlanSubCmd, config: &ImportConfig) -> Result<()> {
    let tests = read_tests(&cmd.input.tests)?;
    let catalog: PipelineCatalog = read(&cmd.catalog, "pipeline catalog")?;
    let files: FileIndex = match &cmd.files {
        Some(path) => read(path, "uploaded file listing")?,
        None => FileIndex::default(),
    };
    let remote_tests: Option<Vec<ExerciseTest>> = cmd
        .test_ids
        .as_ref()
        .map(|path| read(path, "remote test listing"))
        .transpose()?;

    let mut compiler = PlanCompiler::new(config);
    if let Some(remote_tests) = &remote_tests {
        compiler = compiler.with_test_ids(remote_tests);
    }
    let res = compiler.compile(&tests, &catalog, &cmd.ext, &files);
    res.log_summary();

    let json = serde_json::to_string_pretty(&res.plan)?;
    write_output(cmd.input.output.as_deref(), &json)?;

    if !res.is_complete() && !cmd.allow_partial {
        bail!(
            "{} test(s) could not be compiled; pass --allow-partial to accept the plan anyway",
            res.errors.len()
        );
    }
    Ok(())
}

fn task_graph(cmd: opt::TaskGraphSubCmd, config: &ImportConfig) -> Result<()> {
    let tests = read_tests(&cmd.input.tests)?;
    let selected: Vec<TestDefinition> = match cmd.test {
        Some(number) => tests.into_iter().filter(|t| t.number == number).collect(),
        None => tests,
    };
    if let (Some(number), true) = (cmd.test, selected.is_empty()) {
        bail!("No test numbered {}", number);
    }

    let mut options = config.task_graph.clone();
    options.fatal_failures |= cmd.fatal;
    let emitter = TaskGraphEmitter::new(&options, &config.judges);
    let (graph, errors) = emitter.emit_all(&selected, &cmd.ext, cmd.base_priority);
    tracing::info!(tasks = graph.tasks.len(), failed = errors.len(), "Task graph emitted");

    write_output(cmd.input.output.as_deref(), &graph.to_yaml()?)?;

    if !errors.is_empty() {
        for e in &errors {
            tracing::error!("{}", e);
        }
        bail!("{} test(s) could not be emitted", errors.len());
    }
    Ok(())
}

fn limits(cmd: opt::LimitsSubCmd, config: &ImportConfig) -> Result<()> {
    let tests = read_tests(&cmd.input.tests)?;
    let mut res: BTreeMap<&str, LimitsConfig> = BTreeMap::new();
    let mut failed = 0;
    for ext in &cmd.ext {
        let environment = match config.environment_for(ext) {
            Some(env) => env,
            None => {
                tracing::warn!(extension = %ext, "No runtime environment for extension, skipped");
                continue;
            }
        };
        let (limits, errors) = limits_config(&tests, ext);
        for e in &errors {
            tracing::warn!(%environment, "{}", e);
        }
        failed += errors.len();
        res.insert(environment, limits);
    }
    if failed > 0 {
        tracing::warn!(failed, "Some tests have no limits");
    }

    write_output(cmd.input.output.as_deref(), &serde_json::to_string_pretty(&res)?)
}

fn read_tests(path: &Path) -> Result<Vec<TestDefinition>> {
    let tests: Vec<TestDefinition> = read(path, "test definitions")?;
    tracing::debug!(count = tests.len(), path = %path.display(), "Loaded tests");
    Ok(tests)
}

fn read<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    load_document(path).with_context(|| format!("Failed to read {} from {}", what, path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(content.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write to standard output")
        }
    }
}
