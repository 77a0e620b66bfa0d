//! Command implementations for the `ipums-ddi` CLI
//!
//! Each subcommand loads what it needs through the library API and prints
//! to stdout. Logging goes to stderr so output stays pipeable.

use crate::cli::args::{Args, Commands, DiscoverArgs, InspectArgs, ReadArgs};
use crate::codebook::{Codebook, read_ipums_ddi};
use crate::discovery::{default_extract_dir, discover_extracts, expand_home};
use crate::labels::apply_value_labels;
use crate::models::VariableDescriptor;
use crate::reader::read_microdata;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Dispatch to the subcommand named in `args`
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args);
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Commands::Inspect(inspect) => run_inspect(inspect),
        Commands::Read(read) => run_read(read, args.show_progress()),
        Commands::Discover(discover) => run_discover(discover),
    }
}

/// Set up structured logging on stderr based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ipums_ddi={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn load_codebook(path: &Path) -> Result<Codebook> {
    let path = expand_home(path);
    read_ipums_ddi(&path).with_context(|| format!("Failed to load codebook {}", path.display()))
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let codebook = load_codebook(&args.codebook)?;

    if let Some(name) = &args.variable {
        let variable = codebook.require_variable(name)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(variable)?);
        } else {
            print_variable(&codebook, variable);
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&codebook)?);
    } else {
        print_codebook(&codebook);
    }
    Ok(())
}

fn print_codebook(codebook: &Codebook) {
    println!("{}", "File metadata".bright_green().bold());
    for (key, value) in codebook.file_metadata.iter() {
        println!("  {:<12} {}", key.bright_cyan(), value.unwrap_or("-"));
    }

    println!();
    println!(
        "{} {}",
        "Variables".bright_green().bold(),
        format!("({})", codebook.variables.len()).bright_black()
    );
    let schema = &codebook.schema;
    for (i, variable) in codebook.variables.iter().enumerate() {
        println!(
            "  {:>4}  {:<12} {:<9} {:<12} {:<8} {}",
            (i + 1).to_string().bright_yellow(),
            variable.display_name(i).bright_cyan(),
            variable.field_type.as_deref().unwrap_or("-"),
            schema.column_specs[i].to_string(),
            schema.column_dtypes[i].to_string(),
            variable.label.as_deref().unwrap_or("").bright_black()
        );
    }
}

fn print_variable(codebook: &Codebook, variable: &VariableDescriptor) {
    let name = variable.name.as_deref().unwrap_or("-");
    println!("{}", name.bright_cyan().bold());

    let optional = [
        ("Label", &variable.label),
        ("Concept", &variable.concept),
        ("Type", &variable.field_type),
        ("Format", &variable.data_type),
        ("Decimals", &variable.decimals),
        ("Files", &variable.files),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            println!("  {:<12} {}", field.bright_white(), value);
        }
    }
    if let Some(position) = codebook.schema.position(name) {
        println!(
            "  {:<12} {} ({})",
            "Columns".bright_white(),
            codebook.schema.column_specs[position],
            codebook.schema.column_dtypes[position]
        );
    }
    if let Some(description) = &variable.description {
        println!();
        println!("{}", description);
    }

    if variable.has_categories() {
        println!();
        println!("{}", "Categories".bright_green().bold());
        for category in &variable.categories {
            println!(
                "  {:>8}  {}",
                category.code.as_deref().unwrap_or("-").bright_yellow(),
                category.label.as_deref().unwrap_or("")
            );
        }
    }
}

fn run_read(args: &ReadArgs, show_progress: bool) -> Result<()> {
    let codebook = load_codebook(&args.codebook)?;
    let config = args.to_reader_config();
    let data_path = expand_home(&args.data);

    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Reading {}", data_path.display()));
        Some(pb)
    } else {
        None
    };

    let result = read_microdata(&codebook, &data_path, &config)
        .with_context(|| format!("Failed to read {}", data_path.display()));
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let mut df = result?;

    if !args.labels.is_empty() {
        apply_value_labels(&mut df, &codebook, &args.labels)
            .context("Failed to apply value labels")?;
    }

    info!("Read {} rows x {} columns", df.height(), df.width());
    println!("{}", df);
    Ok(())
}

fn run_discover(args: &DiscoverArgs) -> Result<()> {
    let dir = match &args.dir {
        Some(dir) => expand_home(dir),
        None => default_extract_dir().context("Could not determine the download directory")?,
    };
    let extracts = discover_extracts(&dir, args.recursive)?;

    if extracts.is_empty() {
        println!("No IPUMS codebooks found in {}", dir.display());
        return Ok(());
    }

    println!(
        "{}",
        format!("IPUMS extracts in {}:", dir.display()).bright_green().bold()
    );
    for extract in &extracts {
        let collection = extract
            .collection
            .map(|c| c.display_name())
            .unwrap_or("unknown collection");
        let data = match &extract.data_path {
            Some(path) => path.display().to_string().normal(),
            None => "no data file".red(),
        };
        println!(
            "  {} {} {}",
            extract.name.bright_cyan(),
            format!("({})", collection).bright_black(),
            data
        );
    }
    Ok(())
}
