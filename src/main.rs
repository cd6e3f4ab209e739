// SPDX-FileCopyrightText: 2021-2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

mod cli;

use std::{io::Write, path::PathBuf};

use clap::crate_name;
use cli_utils::{logging, BoxResult};
use tld_scraper::{aggregator::Aggregator, fetcher::HttpFetcher, overrides, scrapers, settings};
use tracing::instrument;
use tracing_subscriber::filter::LevelFilter;

#[allow(clippy::print_stdout)]
fn print_version_and_exit(quiet: bool) {
    if !quiet {
        print!("{} ", clap::crate_name!());
    }
    println!("{}", tld_scraper::VERSION);
    std::process::exit(0);
}

/// Tells whether upstream was unreachable or inconsistent.
fn log_fatal(err: &scrapers::Error) {
    if err.is_fetch() {
        tracing::error!("Failed to fetch upstream data; no output written: {err}");
    } else if err.is_integrity() {
        tracing::error!("Upstream data is inconsistent; no output written: {err}");
    } else {
        tracing::error!("Failed to aggregate TLD records; no output written: {err}");
    }
}

/// Reads the output of a previous run, if one was given.
async fn load_overrides(input: Option<&PathBuf>) -> BoxResult<overrides::Overrides> {
    let overrides = overrides::Overrides::new();
    let Some(input) = input else {
        return Ok(overrides);
    };
    tracing::info!("Reading carry-forward data from '{}' ...", input.display());
    let json = tokio::fs::read_to_string(input).await.map_err(|err| {
        format!(
            "Failed to read the previous output '{}': {err}",
            input.display()
        )
    })?;
    let carry_forward = overrides::parse_carry_forward(&json).map_err(|err| {
        format!(
            "Failed to parse the previous output '{}': {err}",
            input.display()
        )
    })?;
    let overrides = overrides.with_carry_forward(carry_forward);
    tracing::info!(
        "Carrying forward brand info of {} TLDs.",
        overrides.carry_forward_len()
    );
    Ok(overrides)
}

#[tokio::main]
#[instrument]
async fn main() -> BoxResult<()> {
    let log_reload_handle = logging::setup(crate_name!())?;
    let args = cli::args_matcher().get_matches();

    let quiet = args.get_flag(cli::A_L_QUIET);
    let version = args.get_flag(cli::A_L_VERSION);
    if version {
        print_version_and_exit(quiet);
    }

    let verbose = args.get_flag(cli::A_L_VERBOSE);

    let log_level = if verbose {
        LevelFilter::TRACE
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    logging::set_log_level_tracing(&log_reload_handle, log_level)?;
    let input = args.get_one::<PathBuf>(cli::A_L_INPUT);
    let output = args.get_one::<PathBuf>(cli::A_L_OUTPUT);
    let config_file = args.get_one::<String>(cli::A_L_CONFIG);

    let mut run_settings = settings::load(config_file.map(String::as_str))?;
    if let Some(concurrency) = args.get_one::<usize>(cli::A_L_CONCURRENCY) {
        run_settings.agreement_concurrency = *concurrency;
    }
    let run_settings = run_settings.validate()?;

    let overrides = load_overrides(input).await?;
    let fetcher = HttpFetcher::new(&run_settings)?;
    let aggregator = Aggregator::from_settings(&run_settings, overrides);

    let records = aggregator
        .run(&fetcher, chrono::Utc::now())
        .await
        .inspect_err(log_fatal)?;
    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');

    if let Some(output) = output {
        tracing::info!("Writing {} records to '{}' ...", records.len(), output.display());
        tokio::fs::write(output, json).await?;
    } else {
        std::io::stdout().lock().write_all(json.as_bytes())?;
    }

    Ok(())
}
