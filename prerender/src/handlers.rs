use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use prerender_core::config::{MirrorConfig, PartialConfig};
use prerender_core::mirror::{MirrorOptions, execute_mirror};
use prerender_core::report::{ReportFormat, generate_json_report, generate_mirror_report, summarize};
use prerender_scanner::CrawlResult;
use std::fs;
use std::path::PathBuf;
use tracing::Level;
use url::Url;

/// Exit status when every write succeeded.
pub const EXIT_OK: i32 = 0;
/// Exit status when at least one resource could not be written.
pub const EXIT_WRITE_FAILURE: i32 = 1;
/// Exit status for configuration and startup errors.
pub const EXIT_ERROR: i32 = 2;

/// Map the `-v` count to the maximum tracing level.
pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Settings given directly on the command line.
pub fn partial_config_from_args(args: &ArgMatches) -> PartialConfig {
    PartialConfig {
        target_url: args.get_one::<Url>("URL").cloned(),
        output_dir: args.get_one::<PathBuf>("output").cloned(),
        timeout_secs: args.get_one::<u64>("timeout").copied(),
        user_agent: args.get_one::<String>("user-agent").cloned(),
    }
}

/// Config file values (if `--config` was given) overridden by CLI arguments.
pub fn load_config(args: &ArgMatches) -> Result<MirrorConfig> {
    let file = match args.get_one::<PathBuf>("config") {
        Some(path) => PartialConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => PartialConfig::default(),
    };

    let config = file
        .merge(partial_config_from_args(args))
        .build()
        .context("Invalid configuration")?;
    Ok(config)
}

pub fn render_report(results: &[CrawlResult], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_mirror_report(results)),
        ReportFormat::Json => generate_json_report(results).context("Failed to serialize report"),
    }
}

pub fn exit_code(results: &[CrawlResult]) -> i32 {
    if results.iter().any(|r| r.is_write_failure()) {
        EXIT_WRITE_FAILURE
    } else {
        EXIT_OK
    }
}

pub async fn handle_mirror(args: &ArgMatches) -> Result<i32> {
    let config = load_config(args)?;
    let quiet = args.get_flag("quiet");
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let report_path = args.get_one::<PathBuf>("report");

    if !quiet {
        eprintln!(
            "\n{} Prerendering {}",
            "→".blue().bold(),
            config.target_url.as_str().bright_white()
        );
        eprintln!(
            "{} Output: {}\n",
            "→".blue(),
            config.expanded_output_dir().display()
        );
    }

    let results = execute_mirror(
        MirrorOptions {
            config,
            show_progress_bars: !quiet,
        },
        None,
    )
    .await
    .context("Prerender failed")?;

    if let Some(path) = report_path {
        colored::control::set_override(false);
        let report = render_report(&results, format)?;
        colored::control::unset_override();
        fs::write(path, report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if !quiet {
            eprintln!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
    } else if !quiet || format == ReportFormat::Json {
        print!("{}", render_report(&results, format)?);
    }

    let summary = summarize(&results);
    if summary.write_failed > 0 {
        eprintln!(
            "{} {} resource(s) could not be written; see the report for details",
            "✗".red().bold(),
            summary.write_failed
        );
    } else if !quiet {
        eprintln!(
            "{} Mirrored {} resource(s)",
            "✓".green().bold(),
            summary.saved
        );
    }

    Ok(exit_code(&results))
}
