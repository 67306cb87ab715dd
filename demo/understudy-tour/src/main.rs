//! Guided tour of the understudy test doubles.
//!
//! Every scenario exercises one usage pattern of the library against doubles of a small list
//! interface, and the tour reports what each double recorded.

mod list;
mod report;
mod scenarios;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use slog::{Drain, Fuse, Level, Logger, debug};
use slog_term::Decorator;
use strum::IntoEnumIterator;

use understudy::{Configuration, StdResult};

use crate::scenarios::{Scenario, Tour};

enum LogOutputType {
    StdErr,
    File(PathBuf),
}

impl LogOutputType {
    fn get_writer(&self) -> StdResult<Box<dyn Write + Send>> {
        let writer: Box<dyn Write + Send> = match self {
            LogOutputType::StdErr => Box::new(std::io::stderr()),
            LogOutputType::File(filepath) => Box::new(File::create(filepath).with_context(
                || format!("Can not create output log file: {}", filepath.display()),
            )?),
        };

        Ok(writer)
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(name = "understudy-tour")]
#[clap(
    about = "This program walks through the usage patterns of the understudy test doubles.",
    long_about = None
)]
#[command(version)]
pub struct Args {
    /// Scenario to run, all of them if not set.
    #[clap(long, value_enum)]
    scenario: Option<Scenario>,

    /// Configuration file of the doubles registry, `UNDERSTUDY_*` environment variables
    /// take precedence over it.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON.
    #[clap(long)]
    json: bool,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable JSON output for logs displayed according to verbosity level
    #[clap(long)]
    log_format_json: bool,

    /// Redirect the logs to a file
    #[clap(long, alias("o"))]
    log_output: Option<PathBuf>,
}

impl Args {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::Warning,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        }
    }

    fn get_log_output_type(&self) -> LogOutputType {
        match &self.log_output {
            Some(filepath) => LogOutputType::File(filepath.clone()),
            None => LogOutputType::StdErr,
        }
    }

    fn wrap_drain<D: Decorator + Send + 'static>(&self, decorator: D) -> Fuse<slog_async::Async> {
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = slog::LevelFilter::new(drain, self.log_level()).fuse();

        slog_async::Async::new(drain).build().fuse()
    }

    fn build_logger(&self) -> StdResult<Logger> {
        let log_output_type = self.get_log_output_type();
        let writer = log_output_type.get_writer()?;

        let drain = if self.log_format_json {
            let drain = slog_bunyan::with_name("understudy-tour", writer)
                .set_pretty(false)
                .build()
                .fuse();
            let drain = slog::LevelFilter::new(drain, self.log_level()).fuse();

            slog_async::Async::new(drain).build().fuse()
        } else {
            match log_output_type {
                LogOutputType::StdErr => self.wrap_drain(slog_term::TermDecorator::new().build()),
                LogOutputType::File(_) => self.wrap_drain(slog_term::PlainDecorator::new(writer)),
            }
        };

        Ok(Logger::root(Arc::new(drain), slog::o!()))
    }

    fn scenarios(&self) -> Vec<Scenario> {
        match self.scenario {
            Some(scenario) => vec![scenario],
            None => Scenario::iter().collect(),
        }
    }

    fn execute(&self, logger: Logger) -> StdResult<()> {
        let configuration = Configuration::load(self.config.as_deref())
            .with_context(|| "Can not load the doubles registry configuration")?;
        debug!(logger, "Configuration loaded"; "configuration" => ?configuration);

        let report = Tour::new(configuration, logger).run(&self.scenarios());
        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .with_context(|| "Can not serialize the tour report")?;
            println!("{json}");
        } else {
            println!("{report}");
        }

        let failures = report.failures();
        if failures > 0 {
            bail!("{failures} scenario(s) failed");
        }

        Ok(())
    }
}

fn main() -> StdResult<()> {
    let args = Args::parse();
    let logger = args.build_logger()?;

    args.execute(logger)
}
