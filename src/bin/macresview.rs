extern crate macresview;

use log::error;
use std::env;
use std::path::PathBuf;

use macresview::convert::{self, ConvertError, Mode, Options};
use macresview::resfork::{ForkError, ResourceFork};
use macresview::restype::{self, Tag};

#[derive(Debug)]
pub enum CliError {
    UsageError(String),
    ForkError(ForkError),
    ConvertError(ConvertError),
}

impl From<ForkError> for CliError {
    fn from(error: ForkError) -> Self {
       CliError::ForkError(error)
    }
}

impl From<ConvertError> for CliError {
    fn from(error: ConvertError) -> Self {
       CliError::ConvertError(error)
    }
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage(app_name: &str) {
    println!("Usage: {} <mode> [options] <file name>", app_name);
    println!();
    println!("Valid Modes:");
    println!("================================================================================");
    println!("\tlist\t\t\tList all resources in the resource fork.");
    println!("\tdump\t\t\tDump all resources (as-is) in the resource\n\t\t\t\tfork.");
    println!("\tconvert\t\t\tConvert all known resources types in the\n\t\t\t\tresource fork.");
    println!();
    println!("Options:");
    println!("\t-n, --use-file-names\tName output files after the resource names.");
    println!("\t-o, --output-dir DIR\tWrite output files to DIR (default: .).");
    println!("\t--map TAG=KIND\t\tHandle TAG as KIND in convert mode, where KIND");
    println!("\t\t\t\tis one of skip, dump, pict, snd, jpeg, icon.");
    println!();
    println!("The 'convert' mode writes PICT resources as PICT files, snd resources as");
    println!("wave files, JPEG resources as .jpg files and icon families as .icns files.");
    println!("Everything else is dumped as-is. Set RUST_LOG=info for progress output.");
}

fn parse_mapping(arg: &str) -> Result<(Tag, restype::ResourceKind), CliError> {
    let mut parts = arg.splitn(2, '=');
    let tag = parts.next().unwrap_or_default();
    let kind = parts.next().unwrap_or_default();
    let tag: Tag = tag.parse().map_err(|_| CliError::UsageError(format!("invalid type code '{}'", tag)))?;
    let kind = restype::str_to_resource_kind(kind)
        .ok_or_else(|| CliError::UsageError(format!("invalid conversion '{}'", kind)))?;
    Ok((tag, kind))
}

fn parse_args(args: &[String]) -> Result<(Mode, Options, PathBuf), CliError> {
    let mode_desc = args.get(1).ok_or_else(|| CliError::UsageError("missing mode".to_string()))?;
    let mode = convert::parse_mode(mode_desc)
        .ok_or_else(|| CliError::UsageError(format!("Unknown mode '{}'", mode_desc)))?;

    let mut options = Options::default();
    let mut file_name: Option<PathBuf> = None;
    let mut iter = args[2..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-n" | "--use-file-names" => options.use_file_names = true,
            "-o" | "--output-dir" => {
                let dir = iter.next().ok_or_else(|| CliError::UsageError(format!("{} needs a directory", arg)))?;
                options.output_dir = PathBuf::from(dir);
            },
            "--map" => {
                let mapping = iter.next().ok_or_else(|| CliError::UsageError("--map needs TAG=KIND".to_string()))?;
                let (tag, kind) = parse_mapping(mapping)?;
                options.kind_overrides.insert(tag, kind);
            },
            _ if file_name.is_none() => file_name = Some(PathBuf::from(arg)),
            _ => return Err(CliError::UsageError(format!("unexpected argument '{}'", arg)))
        }
    }
    let file_name = file_name.ok_or_else(|| CliError::UsageError("missing file name".to_string()))?;
    Ok((mode, options, file_name))
}

fn main() -> Result<(), CliError> {
    env_logger::init();

    println!("\nmacresview {} - Mac Resource Fork Viewer", VERSION);
    println!("Examines Mac resource forks and extracts/converts certain resources\n");

    let args: Vec<String> = env::args().collect();
    let app_name = args.get(0).map(|s| s.as_str()).unwrap_or("macresview");
    let (mode, options, file_name) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            print_usage(app_name);
            return Err(err)
        }
    };

    let mut fork = ResourceFork::new();
    if let Err(err) = fork.load(&file_name) {
        error!("Failed to open file '{}'", file_name.display());
        return Err(err.into())
    }

    let stdout = std::io::stdout();
    let summary = convert::run(&mut fork, mode, &options, &mut stdout.lock())?;
    if mode != Mode::List {
        println!("{} file(s) written, {} failed, {} skipped", summary.written, summary.failed, summary.skipped);
    }
    println!("\nAll done!");
    Ok(())
}
