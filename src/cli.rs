use crate::config::{CoordRange, SimParams};
use crate::reads::{MixtureSpec, SubLibrary};

use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Args, Parser, Subcommand};

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧬 dupsim version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   toy models of global and local (position-window) duplicate rates
   in simulated sequencing reads";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    flatten_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Simulation options shared by every subcommand.
#[derive(Args)]
pub struct SimOpts {
    /// the number of reads simulated per experiment
    #[arg(long, default_value_t = 10_000_000)]
    pub reads: usize,

    /// x coordinate range, as a half-open interval '<start>,<end>'
    #[arg(long, value_parser = |x: &str| ArgRange::try_from(x), default_value = "1100,33000")]
    pub x_range: ArgRange,

    /// y coordinate range, as a half-open interval '<start>,<end>'
    #[arg(long, value_parser = |x: &str| ArgRange::try_from(x), default_value = "1000,50000")]
    pub y_range: ArgRange,

    /// the number of tiles on the simulated flow cell
    #[arg(long, default_value_t = 112)]
    pub tiles: u32,

    /// max x distance for two reads to count as local duplicates (exclusive,
    /// so the search window spans about twice this along the axis)
    #[arg(long, default_value_t = 2500)]
    pub x_dist: u32,

    /// max y distance for two reads to count as local duplicates (exclusive)
    #[arg(long, default_value_t = 2500)]
    pub y_dist: u32,

    /// seed for reproducible simulations; omit to seed from entropy
    #[arg(long)]
    pub seed: Option<u64>,

    /// the number of threads to use
    #[arg(short, long, default_value_t = 4)]
    pub threads: usize,
}

impl SimOpts {
    pub fn params(&self) -> SimParams {
        SimParams {
            x_range: self.x_range.0,
            y_range: self.y_range.0,
            tile_count: self.tiles,
            x_dist: self.x_dist,
            y_dist: self.y_dist,
            total_reads: self.reads,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep the duplicate model across a list of library sizes
    Sweep {
        #[command(flatten)]
        sim: SimOpts,

        /// library sizes to sweep, comma-separated. defaults to the built-in
        /// list: 5,10,20,50, then 100..8000 step 100, then 8000..20000 step 500
        #[arg(long, value_delimiter = ',')]
        sizes: Option<Vec<f64>>,

        /// the output file; defaults to standard output
        #[arg(short)]
        output: Option<String>,

        /// emit one JSON object per result instead of plain columns
        #[arg(long, action)]
        json: bool,
    },

    /// Run the duplicate model on sub-library mixtures, modelling
    /// overrepresented transcripts or amplicons
    Mixture {
        #[command(flatten)]
        sim: SimOpts,

        /// a mixture model, as 'size:fraction[,size:fraction...]'. can be
        /// repeated; any unassigned fraction becomes a residual sub-library.
        /// defaults to the built-in model list.
        #[arg(long = "model", value_parser = |x: &str| ArgMixture::try_from(x))]
        models: Vec<ArgMixture>,

        /// the output file; defaults to standard output
        #[arg(short)]
        output: Option<String>,

        /// emit one JSON object per result instead of plain columns
        #[arg(long, action)]
        json: bool,
    },

    /// Estimate the fraction of reads inside a sampled read's search window
    Window {
        #[command(flatten)]
        sim: SimOpts,

        /// the number of reads sampled for the estimate
        #[arg(long, default_value_t = 10_000)]
        samples: usize,

        /// library size used when generating the read set
        #[arg(long, default_value_t = 10.0)]
        library_size: f64,
    },
}

#[derive(Copy, Clone, Debug)]
pub struct ArgRange(pub CoordRange);

/// Error type for parsing a coordinate range string.
#[derive(Debug)]
pub struct ParseRangeErr(String);

impl std::fmt::Display for ParseRangeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid coordinate range: {}", self.0)
    }
}

impl std::error::Error for ParseRangeErr {}

impl<'a> TryFrom<&'a str> for ArgRange {
    type Error = ParseRangeErr;

    fn try_from(arg: &'a str) -> Result<ArgRange, Self::Error> {
        let parts: Vec<&str> = arg.split(',').collect();

        if parts.len() != 2 {
            return Err(ParseRangeErr(indoc::formatdoc! {"
            Expected format '<start>,<end>', got '{arg}'. The expected format is \
            `a,b`, as in:
              --x-range 1100,33000
              --y-range 1000,50000
            "}));
        }

        let start = parts[0].trim().parse::<u32>().map_err(|_| {
            ParseRangeErr(format!(
                "Invalid range start: '{}' (should be a non-negative integer)",
                parts[0].trim()
            ))
        })?;

        let end = parts[1].trim().parse::<u32>().map_err(|_| {
            ParseRangeErr(format!(
                "Invalid range end: '{}' (should be a non-negative integer)",
                parts[1].trim()
            ))
        })?;

        if start >= end {
            return Err(ParseRangeErr(format!(
                "Range start {start} is not below end {end}"
            )));
        }

        Ok(ArgRange(CoordRange::new(start, end)))
    }
}

#[derive(Clone, Debug)]
pub struct ArgMixture(pub MixtureSpec);

/// Error type for parsing a sub-library mixture string.
#[derive(Debug)]
pub struct ParseMixtureErr(String);

impl std::fmt::Display for ParseMixtureErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid mixture model: {}", self.0)
    }
}

impl std::error::Error for ParseMixtureErr {}

impl<'a> TryFrom<&'a str> for ArgMixture {
    type Error = ParseMixtureErr;

    fn try_from(arg: &'a str) -> Result<ArgMixture, Self::Error> {
        let mut sub_libraries = Vec::new();

        for entry in arg.split(',') {
            let Some((size, fraction)) = entry.split_once(':') else {
                return Err(ParseMixtureErr(indoc::formatdoc! {"
                Expected format '<size>:<fraction>[,<size>:<fraction>...]', got '{arg}'. \
                For example, four sub-libraries of 5000 templates each:
                  --model 5000:0.005,5000:0.004,5000:0.003,5000:0.002
                "}));
            };

            let size = size.trim().parse::<f64>().map_err(|_| {
                ParseMixtureErr(format!("Invalid sub-library size: '{}'", size.trim()))
            })?;
            let fraction = fraction.trim().parse::<f64>().map_err(|_| {
                ParseMixtureErr(format!(
                    "Invalid sub-library fraction: '{}'",
                    fraction.trim()
                ))
            })?;

            sub_libraries.push(SubLibrary { size, fraction });
        }

        let spec =
            MixtureSpec::new(sub_libraries).map_err(|e| ParseMixtureErr(e.to_string()))?;
        Ok(ArgMixture(spec))
    }
}
