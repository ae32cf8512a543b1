extern crate env_logger;
#[macro_use]
extern crate log;
use std::{
    fs::File,
    io::{prelude::*, stdout, BufWriter},
    path::Path,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

mod cli;
mod config;
mod duplicates;
mod reads;
mod sweep;
mod window;

use cli::{Cli, Commands};
use config::SimParams;

/// Creates a `BufWriter` for the given output option. This allows for an output file to be passed
/// or otherwise will default to using standard output.
///
/// If `output` is `Some`, it creates a file at the specified path and returns a `BufWriter` for it.
/// If `output` is `None`, it returns a `BufWriter` for the standard output.
///
/// # Arguments
///
/// * `output` - An `Option` containing the path to the output file as a `String`.
///
/// # Returns
///
/// A `Result` containing a `BufWriter` that implements `Write`.
fn get_writer(output: &Option<String>) -> Result<impl Write> {
    // get output as a BufWriter - equal to stdout if None
    let writer = BufWriter::new(match output {
        Some(ref x) => {
            let file = File::create(Path::new(x))?;
            Box::new(file) as Box<dyn Write + Send>
        }
        None => Box::new(stdout()) as Box<dyn Write + Send>,
    });
    Ok(writer)
}

fn set_threads(threads: usize) -> Result<()> {
    // set number of threads that Rayon uses
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .with_context(|| format!("Unable to set the number of threads to {threads}"))
}

fn log_params(params: &SimParams) {
    info!(
        "Coordinate ranges: x {}, y {}",
        params.x_range, params.y_range
    );
    info!("Number of tiles: {}", params.tile_count);
    info!(
        "Distance thresholds for local duplicates: x {}, y {}",
        params.x_dist, params.y_dist
    );
    info!("Reads per experiment: {}", params.total_reads);
    match params.seed {
        Some(seed) => info!("Seed: {seed}"),
        None => info!("Seed: from entropy (results will vary between runs)"),
    }
}

/// Writes one result per line: either the plain space-separated columns or,
/// with `json` set, one JSON object per record.
fn write_records<T>(writer: &mut impl Write, records: &[T], json: bool) -> Result<()>
where
    T: std::fmt::Display + Serialize,
{
    for record in records {
        if json {
            writeln!(writer, "{}", serde_json::to_string(record)?)?;
        } else {
            writeln!(writer, "{record}")?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    info!("dupsim v{}", cli::VERSION);

    match &cli.command {
        Commands::Sweep {
            sim,
            sizes,
            output,
            json,
        } => {
            let params = sim.params();
            params.validate()?;
            set_threads(sim.threads)?;
            log_params(&params);

            let sizes = sizes
                .clone()
                .unwrap_or_else(sweep::default_library_sizes);
            info!("Sweeping {} library sizes", sizes.len());

            let records = sweep::library_size_sweep(&params, &sizes);

            let mut writer = get_writer(output)?;
            write_records(&mut writer, &records, *json)?;

            info!("Completed successfully.")
        }
        Commands::Mixture {
            sim,
            models,
            output,
            json,
        } => {
            let params = sim.params();
            params.validate()?;
            set_threads(sim.threads)?;
            log_params(&params);

            let models: Vec<reads::MixtureSpec> = if models.is_empty() {
                sweep::default_mixtures()
            } else {
                models.iter().map(|m| m.0.clone()).collect()
            };
            info!("Running {} mixture models", models.len());

            let records = sweep::mixture_sweep(&params, &models)?;

            let mut writer = get_writer(output)?;
            write_records(&mut writer, &records, *json)?;

            info!("Completed successfully.")
        }
        Commands::Window {
            sim,
            samples,
            library_size,
        } => {
            let params = sim.params();
            params.validate()?;
            set_threads(sim.threads)?;
            log_params(&params);

            info!("Computing the search window ratio using {samples} samples");
            let percentage = window::window_ratio(&params, *library_size, *samples);

            println!("In range percentage: {percentage} %");

            info!("Completed successfully.")
        }
    };
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        std::process::exit(1);
    }
}
