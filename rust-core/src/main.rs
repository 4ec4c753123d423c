use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};

use twin_merge::config::TwinMergeConfig;
use twin_merge::interfaces::Connectivity;
use twin_merge::orientation::{misorientation, Orientation};
use twin_merge::scan_io::merge_scan_file;
use twin_merge::symmetries::CrystalSymmetry;

#[derive(Parser)]
#[command(name = "twin-merge")]
#[command(about = "Merge Sigma-3 twins in segmented EBSD maps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the twins of a single scan
    Merge {
        /// Scan file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Report file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        options: MergeOptions,
    },
    /// Merge every scan of a directory
    Batch {
        /// Directory holding the scan files
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory receiving the reports
        #[arg(long)]
        output_dir: PathBuf,

        /// Reprocess scans whose report already exists
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        options: MergeOptions,
    },
    /// Misorientation and twin verdict for two orientations
    Pair {
        /// Bunge Euler angles of the first orientation, degrees
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        first: Vec<f64>,

        /// Bunge Euler angles of the second orientation, degrees
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        second: Vec<f64>,

        #[command(flatten)]
        options: MergeOptions,
    },
}

#[derive(clap::Args)]
struct MergeOptions {
    /// Configuration file (JSON); missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Crystal symmetry
    #[arg(long)]
    symmetry: Option<CrystalSymmetry>,

    /// Misorientation angle tolerance, degrees
    #[arg(long)]
    angle_tolerance: Option<f64>,

    /// Per-component axis tolerance
    #[arg(long)]
    axis_tolerance: Option<f64>,

    /// Pixel connectivity used to find neighbouring grains
    #[arg(long, value_parser = parse_connectivity)]
    connectivity: Option<Connectivity>,
}

impl MergeOptions {
    fn resolve(&self) -> anyhow::Result<TwinMergeConfig> {
        let mut config = match &self.config {
            Some(path) => TwinMergeConfig::from_json_file(path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?,
            None => TwinMergeConfig::default(),
        };
        if let Some(symmetry) = self.symmetry {
            config.symmetry = symmetry;
        }
        if let Some(tolerance) = self.angle_tolerance {
            config.angle_tolerance_deg = tolerance;
        }
        if let Some(tolerance) = self.axis_tolerance {
            config.axis_tolerance = tolerance;
        }
        if let Some(connectivity) = self.connectivity {
            config.connectivity = connectivity;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_connectivity(value: &str) -> Result<Connectivity, String> {
    match value {
        "4" | "four" => Ok(Connectivity::Four),
        "8" | "eight" => Ok(Connectivity::Eight),
        other => Err(format!("connectivity must be 4 or 8, got '{other}'")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Set thread pool size if specified
    if let Some(threads) = cli.threads {
        #[cfg(feature = "parallel")]
        {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("failed to set thread pool size")?;
            info!("Using {} threads", threads);
        }
        #[cfg(not(feature = "parallel"))]
        {
            warn!("Thread count {threads} specified but parallel feature not enabled. Ignoring.");
        }
    }

    info!("Starting twin-merge v{}", twin_merge::VERSION);

    match cli.command {
        Commands::Merge {
            input,
            output,
            options,
        } => merge_one(&input, &output, &options.resolve()?),
        Commands::Batch {
            input_dir,
            output_dir,
            overwrite,
            options,
        } => merge_directory(&input_dir, &output_dir, overwrite, &options.resolve()?),
        Commands::Pair {
            first,
            second,
            options,
        } => compare_pair(&first, &second, &options.resolve()?),
    }
}

fn merge_one(input: &Path, output: &Path, config: &TwinMergeConfig) -> anyhow::Result<()> {
    info!("Merging twins of {}", input.display());
    let summary = merge_scan_file(input, output, config)
        .with_context(|| format!("failed to merge {}", input.display()))?;
    println!(
        "{}: {} grains -> {} grains ({} twin pairs)",
        input.display(),
        summary.grains_before,
        summary.grains_after,
        summary.twin_pairs
    );
    Ok(())
}

fn merge_directory(
    input_dir: &Path,
    output_dir: &Path,
    overwrite: bool,
    config: &TwinMergeConfig,
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("failed to list {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    inputs.sort();
    info!("Found {} scans in {}", inputs.len(), input_dir.display());

    let mut failures = Vec::new();
    for input in &inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let output = output_dir.join(name);
        if output.exists() && !overwrite {
            info!("Skipping {}: {} exists", input.display(), output.display());
            continue;
        }
        if let Err(err) = merge_one(input, &output, config) {
            warn!("{err:#}");
            failures.push(input.display().to_string());
        }
    }

    if !failures.is_empty() {
        bail!("{} of {} scans failed: {}", failures.len(), inputs.len(), failures.join(", "));
    }
    Ok(())
}

fn compare_pair(first: &[f64], second: &[f64], config: &TwinMergeConfig) -> anyhow::Result<()> {
    let (Ok(first), Ok(second)) = (<[f64; 3]>::try_from(first), <[f64; 3]>::try_from(second)) else {
        bail!("orientations need exactly three Euler angles");
    };
    let g1 = Orientation::from_euler_bunge_deg(first);
    let g2 = Orientation::from_euler_bunge_deg(second);
    let symmetry = config.symmetry.operator_set();
    let criterion = config.twin_criterion()?;

    let minimal = misorientation(&g1, &g2, &symmetry);
    println!(
        "disorientation: {:.3}° about [{:.4}, {:.4}, {:.4}]",
        minimal.angle_deg(),
        minimal.axis.x,
        minimal.axis.y,
        minimal.axis.z
    );
    match criterion.twin_misorientation(&g1, &g2, &symmetry) {
        Some(twin) => println!(
            "twin: yes ({:.3}° about [{:.4}, {:.4}, {:.4}])",
            twin.angle_deg(),
            twin.axis.x,
            twin.axis.y,
            twin.axis.z
        ),
        None => println!("twin: no"),
    }
    Ok(())
}
