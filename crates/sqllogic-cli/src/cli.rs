//! `slt`: run sqllogictest scripts against a SQL backend

mod logging;

use anyhow::Context;
use clap::{ArgAction, Parser};
use sqllogic_drivers::DriverRegistry;
use sqllogic_runner::{ExecutionOptions, SkipSet, SltExecutor, TestLoader};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "slt", version, about = "Run sqllogictest scripts against a SQL backend")]
struct Args {
    /// Test files or directories, relative to --directory when one is given
    #[arg(value_name = "TEST")]
    tests: Vec<PathBuf>,

    /// Root of the test suite
    #[arg(short = 'd', long, env = "SLT_DIRECTORY", value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Backend to run against
    #[arg(short = 'e', long, env = "SLT_EXECUTOR", value_name = "NAME")]
    executor: Option<String>,

    /// Stop a file at its first failing query
    #[arg(short = 'x', long)]
    stop_at_first_error: bool,

    /// Parse the scripts without executing anything
    #[arg(short = 'n', long)]
    do_not_execute: bool,

    /// File listing queries to skip, one per line
    #[arg(short = 'b', long = "bugs", value_name = "FILE")]
    bugs: Option<PathBuf>,

    /// More output; repeat for more detail
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Database user
    #[arg(short = 'u', long, env = "SLT_USER")]
    user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, env = "SLT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "SLT_HOST")]
    host: Option<String>,

    #[arg(long, env = "SLT_PORT")]
    port: Option<u16>,

    #[arg(long, env = "SLT_DATABASE")]
    database: Option<String>,

    /// Engine name for skipif/onlyif, defaults to the backend's dialect
    #[arg(long, value_name = "NAME")]
    engine_name: Option<String>,

    /// TOML file with run options; flags override its values
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// List the registered executors and exit
    #[arg(long)]
    list_executors: bool,
}

impl Args {
    /// Layer the command line over options read from a file
    fn apply(&self, mut options: ExecutionOptions) -> ExecutionOptions {
        if !self.tests.is_empty() {
            options.tests = self.tests.clone();
        }
        if let Some(directory) = &self.directory {
            options.directory = Some(directory.clone());
        }
        if let Some(executor) = &self.executor {
            options.executor = executor.clone();
        }
        options.stop_at_first_error |= self.stop_at_first_error;
        options.do_not_execute |= self.do_not_execute;
        if let Some(bugs) = &self.bugs {
            options.bugs_file = Some(bugs.clone());
        }
        options.verbosity = options.verbosity.max(self.verbose);
        if let Some(engine) = &self.engine_name {
            options.engine_name = Some(engine.clone());
        }

        let connection = &mut options.connection;
        if self.host.is_some() {
            connection.host = self.host.clone();
        }
        if self.port.is_some() {
            connection.port = self.port;
        }
        if self.database.is_some() {
            connection.database = self.database.clone();
        }
        if self.user.is_some() {
            connection.user = self.user.clone();
        }
        if self.password.is_some() {
            connection.password = self.password.clone();
        }
        options
    }

    fn options(&self) -> anyhow::Result<ExecutionOptions> {
        let base = match &self.config {
            Some(path) => ExecutionOptions::load(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => ExecutionOptions::default(),
        };
        Ok(self.apply(base))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let options = args.options()?;
    logging::init(logging::LoggingConfig::for_verbosity(
        options.verbosity,
        args.log_json,
    ))?;

    let registry = DriverRegistry::with_defaults();
    if args.list_executors {
        for name in registry.list() {
            if let Some(driver) = registry.get(name) {
                println!("{name}\t{}", driver.display_name());
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let driver = registry.resolve(&options.executor)?;
    let skip_set = match &options.bugs_file {
        Some(path) => SkipSet::load(path)
            .with_context(|| format!("Failed to read skip list {}", path.display()))?,
        None => SkipSet::new(),
    };
    let engine = options
        .engine_name
        .clone()
        .unwrap_or_else(|| driver.dialect_id().to_string());
    let roots = options.test_roots()?;

    tracing::info!(
        executor = %options.executor,
        engine = %engine,
        skipped = skip_set.len(),
        "starting run"
    );

    let executor = SltExecutor::new(driver, options.connection_config())
        .with_skip_set(skip_set)
        .do_not_execute(options.do_not_execute);
    let mut loader = TestLoader::new(executor, engine, options.stop_at_first_error);
    for root in &roots {
        loader
            .run_path(root)
            .await
            .with_context(|| format!("Run aborted under {}", root.display()))?;
    }

    let statistics = loader.statistics();
    if options.verbosity > 0 {
        print!("{statistics:#}");
    } else {
        print!("{statistics}");
    }
    println!(
        "{} tests in {:.3}s",
        loader.session().total_tests(),
        loader.session().elapsed().as_secs_f64()
    );

    if statistics.failed == 0 && statistics.files_not_parsed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
