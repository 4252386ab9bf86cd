use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zev_structure::config::AnalyzerConfig;
use zev_structure::structure::{consumption_data, open_document, validate_file, StructureSelector};
use zev_structure::zev::HierarchyParser;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Score every sheet reading and report the recommendation
    Analyze,
    /// Rebuild the meter hierarchy
    Parse,
    /// Re-read the recommended sheet with the recommended reading
    Read,
    /// Check consumption sheets for their required columns
    Validate,
    /// Validation as a plain-text report
    Report,
    /// Consumption sheet with typed timestamp and kWh columns
    Consumption,
}

#[derive(Parser)]
#[command(name = "zev-structure")]
#[command(about = "Recognize the structure of a ZEV energy-sharing export", long_about = None)]
struct Cli {
    /// Spreadsheet file (xlsx, xls, xlsb, ods)
    file: PathBuf,

    #[arg(long, value_enum, default_value = "parse")]
    mode: Mode,

    /// Restrict analyze/parse/consumption to one sheet (default: whole document / first sheet)
    #[arg(long)]
    sheet: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,zev_structure=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = AnalyzerConfig::from_env();
    info!("Running {:?} on {} with {:?}", cli.mode, cli.file.display(), config);

    match cli.mode {
        Mode::Analyze => {
            let selector = StructureSelector::new(config);
            let mut workbook = open_document(&cli.file)?;
            match cli.sheet.as_deref() {
                Some(sheet) => print_json(&selector.analyze_sheet(&mut workbook, sheet)?)?,
                None => print_json(&selector.analyze_document(&mut workbook)?)?,
            }
        }
        Mode::Parse => {
            let parser = HierarchyParser::new(config);
            let report = match cli.sheet.as_deref() {
                Some(sheet) => parser.parse_file_sheet(&cli.file, sheet),
                None => parser.parse_file(&cli.file),
            };
            print_json(&report)?;
        }
        Mode::Read => {
            let selector = StructureSelector::new(config);
            let mut workbook = open_document(&cli.file)?;
            print_json(&selector.read_with_recommended_method(&mut workbook)?)?;
        }
        Mode::Validate => print_json(&validate_file(&cli.file)?)?,
        Mode::Report => println!("{}", validate_file(&cli.file)?),
        Mode::Consumption => {
            let mut workbook = open_document(&cli.file)?;
            print_json(&consumption_data(&mut workbook, cli.sheet.as_deref())?)?;
        }
    }

    Ok(())
}
