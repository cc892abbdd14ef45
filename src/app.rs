//! Main application orchestration and execution

use crate::{
    checks::Check,
    cli::Cli,
    client::{HttpExecutor, RequestExecutor},
    config::{display_config_summary, load_config, validate_config, EnvManager, ValidationLevel},
    error::Result,
    evaluator::ThresholdEvaluator,
    logging::LoggerFactory,
    models::{RunResult, TestConfig},
    output::ResultReporter,
    scheduler::Scheduler,
    stats::MetricsCollector,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the application and decide the process exit code
    pub async fn run(self) -> Result<ExitCode> {
        if let Some(path) = &self.cli.init_env {
            EnvManager::save_example_env_file(path)?;
            eprintln!("Wrote example environment file to {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }

        let config = load_config(self.cli.clone())?;
        let warnings = validate_config(&config)?;

        let factory = LoggerFactory::new(&config);
        let logger = factory.create_logger("APP");

        if config.debug {
            eprintln!("{} v{} (session {})", crate::PKG_NAME, crate::LONG_VERSION, factory.session_id());
            eprint!("{}", self.cli.get_config_summary());
            eprintln!("Configuration Summary:\n{}", display_config_summary(&config));
            for problem in EnvManager::validate_current_env() {
                eprintln!("{}", problem);
            }
        }

        for warning in &warnings {
            match warning.level {
                ValidationLevel::Warning => logger.warn(&warning.message).log(),
                ValidationLevel::Info => logger.info(&warning.message).log(),
            }
        }

        let result = run_test(&config, &factory).await?;
        crate::log_info!(
            logger,
            "Run finished: {} requests, {} iterations",
            result.total_requests,
            result.total_iterations
        );
        ResultReporter::from_config(&config).report(&result)
    }
}

/// Run a load test against the configured URL over HTTP
pub async fn run_test(config: &TestConfig, factory: &LoggerFactory) -> Result<RunResult> {
    let executor: Arc<dyn RequestExecutor> = Arc::new(HttpExecutor::from_config(config)?);
    run_with_executor(config, executor, factory).await
}

/// Run a load test with any executor, then evaluate thresholds
///
/// Ctrl-C ends the run early; in-flight requests still get the grace period.
pub async fn run_with_executor(
    config: &TestConfig,
    executor: Arc<dyn RequestExecutor>,
    factory: &LoggerFactory,
) -> Result<RunResult> {
    let collector = Arc::new(MetricsCollector::with_default_shards()?);
    let checks: Vec<Check> = config.checks.iter().map(Check::from_spec).collect();

    let scheduler = Scheduler::new(executor, collector.clone(), factory.create_logger("SCHED")).with_checks(checks);
    let handle = scheduler.start(config)?;

    let stop = handle.stop_token();
    let interrupt_logger = factory.create_logger("APP");
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_logger.warn("Interrupted, stopping virtual users").log();
            stop.cancel();
        }
    });

    let stats = handle.wait().await;
    interrupt.abort();
    let stats = stats?;

    let series = collector.snapshot()?;
    let evaluator = ThresholdEvaluator::new(factory.create_logger("EVAL"));
    Ok(evaluator.evaluate_for(&series, &config.thresholds, &stats, &config.target_url))
}
