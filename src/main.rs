//! Cellgrid - batch front end for the spreadsheet engine

mod config;

use anyhow::{Context, Result, anyhow, bail};
use cellgrid_core::Spreadsheet;
use cellgrid_engine::engine::CellRef;
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: cellgrid [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet to load (.xml)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <CELL=TEXT>     Set a cell's text (can be repeated)");
    eprintln!("      --color <CELL=ARGB>   Set a cell's background color (can be repeated)");
    eprintln!("  -u, --undo <N>            Undo the last N edits");
    eprintln!("  -o, --output <FILE>       Save the resulting sheet as XML");
    eprintln!("      --rows <N>            Number of rows");
    eprintln!("      --columns <N>         Number of columns");
    eprintln!("      --config <FILE>       Read settings from a TOML file");
    eprintln!("      --no-default-config   Ignore the per-user config.toml");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    edits: Vec<(String, String)>,
    colors: Vec<(String, String)>,
    undo: usize,
    output_file: Option<PathBuf>,
    rows: Option<usize>,
    columns: Option<usize>,
    config_file: Option<PathBuf>,
    no_default_config: bool,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--no-default-config" => options.no_default_config = true,
            "-s" | "--set" | "--color" | "-u" | "--undo" | "-o" | "--output" | "--rows"
            | "--columns" | "--config" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    eprintln!("Error: {} requires a value", arg);
                    std::process::exit(1);
                };
                if let Err(e) = apply_option(&mut options, arg, value) {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if options.file_path.is_none() {
                    options.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    if let Err(e) = run(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn apply_option(options: &mut Options, flag: &str, value: &str) -> Result<()> {
    match flag {
        "-s" | "--set" => options.edits.push(split_assignment(flag, value)?),
        "--color" => options.colors.push(split_assignment(flag, value)?),
        "-u" | "--undo" => options.undo = parse_count(flag, value)?,
        "-o" | "--output" => options.output_file = Some(PathBuf::from(value)),
        "--rows" => options.rows = Some(parse_count(flag, value)?),
        "--columns" => options.columns = Some(parse_count(flag, value)?),
        "--config" => options.config_file = Some(PathBuf::from(value)),
        _ => bail!("Unknown option: {}", flag),
    }
    Ok(())
}

fn split_assignment(flag: &str, value: &str) -> Result<(String, String)> {
    let (cell, rest) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("{} expects CELL=VALUE, got {:?}", flag, value))?;
    Ok((cell.trim().to_string(), rest.to_string()))
}

fn parse_count(flag: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} expects a non-negative number, got {:?}", flag, value))
}

/// Colors are decimal ARGB, or hex with a `0x` prefix.
fn parse_color(value: &str) -> Result<u32> {
    let value = value.trim();
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.with_context(|| format!("Invalid color: {:?}", value))
}

fn resolve(sheet: &Spreadsheet, name: &str) -> Result<CellRef> {
    if !sheet.is_valid_cell_name(name) {
        bail!("Invalid cell name: {}", name);
    }
    CellRef::from_str(name).ok_or_else(|| anyhow!("Invalid cell name: {}", name))
}

fn run(options: Options) -> Result<()> {
    let mut config =
        config::load_config(options.config_file.as_deref(), !options.no_default_config)?;
    if let Some(rows) = options.rows {
        config.rows = rows;
    }
    if let Some(columns) = options.columns {
        config.columns = columns;
    }

    let mut sheet = Spreadsheet::with_config(config);
    if let Some(path) = &options.file_path {
        sheet
            .load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }

    for (name, text) in &options.edits {
        let cell_ref = resolve(&sheet, name)?;
        sheet.set_text(&cell_ref, text)?;
    }
    for (name, color) in &options.colors {
        let cell_ref = resolve(&sheet, name)?;
        sheet.set_background_color(&cell_ref, parse_color(color)?)?;
    }
    for _ in 0..options.undo {
        if !sheet.undo() {
            break;
        }
    }

    for cell in sheet.cells().filter(|cell| !cell.text().is_empty()) {
        println!("{}: {}", cell.name(), cell.value());
    }

    if let Some(output_path) = &options.output_file {
        sheet
            .save_as(output_path)
            .with_context(|| format!("Failed to save {}", output_path.display()))?;
        eprintln!("Saved to {}", output_path.display());
    }
    Ok(())
}
