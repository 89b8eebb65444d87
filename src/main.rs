//! CLI entry point for `device2fga`.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use device2fga::generator::model_generator::{self, GenerateOptions};
use device2fga::output::formatter;
use device2fga::parser::capabilities::CapabilityCatalog;
use device2fga::parser::devices;
use device2fga::parser::subjects::SubjectCatalog;
use device2fga::{Error, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "device2fga",
    about = "Fold per-device access-control configuration into canonical OpenFGA types and tuples"
)]
struct Cli {
    /// Device configuration JSON (`[{device, type, roles, actions}]`)
    devices: PathBuf,

    /// Capability catalog JSON (`[{devicetype, commands, attributes}]`)
    #[arg(long)]
    capabilities: PathBuf,

    /// User attribute JSON used to resolve subject types
    #[arg(long)]
    subjects: PathBuf,

    /// User group JSON (`[{uid, parent}]`)
    #[arg(long)]
    groups: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "device2fga-output")]
    output_dir: PathBuf,

    /// Base name for output files (defaults to the devices file stem)
    #[arg(long)]
    name: Option<String>,

    /// Merge devices whose relations differ only in statement order
    #[arg(long)]
    merge_reordered: bool,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{e}");
        process::exit(2);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(Error::io(path))
}

fn run(cli: &Cli) -> Result<()> {
    let mut catalog = CapabilityCatalog::new();
    catalog.load_from_json(&read(&cli.capabilities)?)?;

    let groups_json = cli.groups.as_deref().map(read).transpose()?;
    let subjects = SubjectCatalog::from_json(&read(&cli.subjects)?, groups_json.as_deref())?;

    let devices = devices::load_devices(&read(&cli.devices)?)?;
    info!(
        devices = devices.len(),
        families = catalog.len(),
        subjects = subjects.records().len(),
        "loaded inputs"
    );

    let model = model_generator::generate_model(
        &devices,
        &catalog,
        &subjects,
        GenerateOptions {
            sort_relations: cli.merge_reordered,
        },
    )?;

    let name = cli.name.clone().unwrap_or_else(|| {
        cli.devices
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    });
    formatter::write_output(&cli.output_dir, &name, &model)?;
    info!(output_dir = %cli.output_dir.display(), name = %name, "wrote output");

    Ok(())
}
