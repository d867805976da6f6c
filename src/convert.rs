use log::{error, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::resfork::ResourceFork;
use crate::resource::{ResourceData, ResourceKey};
use crate::restype::{self, ResourceKind, Tag};
use crate::sound::{self, SoundError};
use crate::{icon, pict, util};

#[derive(Debug)]
pub enum ConvertError {
    IoError(std::io::Error),
    MissingInput,
    MissingFilename,
    SoundError(SoundError),
}

impl From<std::io::Error> for ConvertError {
    fn from(error: std::io::Error) -> Self {
       ConvertError::IoError(error)
    }
}

impl From<SoundError> for ConvertError {
    fn from(error: SoundError) -> Self {
       ConvertError::SoundError(error)
    }
}

#[derive(Debug,PartialEq,Eq,Clone,Copy)]
pub enum Mode {
    List,
    Dump,
    Convert,
}

pub fn parse_mode(mode: &str) -> Option<Mode> {
    match mode {
        "list" => Some(Mode::List),
        "dump" => Some(Mode::Dump),
        "convert" => Some(Mode::Convert),
        _ => None
    }
}

pub struct Options {
    pub use_file_names: bool,
    pub output_dir: PathBuf,
    /// Takes precedence over the built-in tag table.
    pub kind_overrides: HashMap<Tag, ResourceKind>,
}

impl Default for Options {
    fn default() -> Self {
        Options{ use_file_names: false, output_dir: PathBuf::from("."), kind_overrides: HashMap::new() }
    }
}

impl Options {
    pub fn resource_kind(&self, tag: Tag) -> ResourceKind {
        self.kind_overrides.get(&tag).copied().unwrap_or_else(|| restype::default_resource_kind(tag))
    }
}

#[derive(Debug,Default,PartialEq,Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Applies `extension` to the file name part of `file_name`.
pub fn output_path(file_name: &Path, extension: &str) -> Result<PathBuf, ConvertError> {
    let name = file_name.file_name()
        .and_then(|n| n.to_str())
        .ok_or(ConvertError::MissingFilename)?;
    Ok(file_name.with_file_name(util::add_extension(name, extension)))
}

/// Creates `path` and writes all of `contents` to it.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<PathBuf, ConvertError> {
    let mut output = File::create(path).map_err(|err| {
        error!("Could not open '{}' for writing", path.display());
        err
    })?;
    output.write_all(contents)?;
    output.flush()?;
    Ok(path.to_path_buf())
}

/// Writes the resource bytes as they are.
pub fn output_data_pair(pair: Option<&ResourceData>, file_name: &Path) -> Result<PathBuf, ConvertError> {
    let pair = pair.ok_or(ConvertError::MissingInput)?;
    if file_name.file_name().is_none() {
        return Err(ConvertError::MissingFilename)
    }
    write_output(file_name, &pair.data)
}

/// JPEG resources already hold a complete file; only the name changes.
pub fn output_jpeg(pair: Option<&ResourceData>, file_name: &Path) -> Result<PathBuf, ConvertError> {
    let pair = pair.ok_or(ConvertError::MissingInput)?;
    let path = output_path(file_name, ".jpg")?;
    write_output(&path, &pair.data)
}

fn convert_resource(fork: &mut ResourceFork, kind: ResourceKind, tag: Tag, id: u16, file_name: &Path) -> Option<Result<PathBuf, ConvertError>> {
    let output: fn(Option<&ResourceData>, &Path) -> Result<PathBuf, ConvertError> = match kind {
        ResourceKind::Skip | ResourceKind::IconMember => return None,
        ResourceKind::Dump => output_data_pair,
        ResourceKind::Picture => pict::output_pict,
        ResourceKind::Sound => sound::output_snd,
        ResourceKind::Jpeg => output_jpeg,
    };
    let pair = fork.get_resource(ResourceKey::Id(tag, id));
    Some(output(pair.as_ref(), file_name))
}

/// Runs one mode over every resource in the fork. `list` output goes to
/// `out`. Failures on single resources are counted and the run goes on;
/// only an unusable output directory stops it.
pub fn run<W: Write>(fork: &mut ResourceFork, mode: Mode, options: &Options, out: &mut W) -> Result<RunSummary, ConvertError> {
    let mut summary = RunSummary::default();

    if mode != Mode::List {
        std::fs::create_dir_all(&options.output_dir).map_err(|err| {
            error!("Could not create output directory '{}'", options.output_dir.display());
            err
        })?;
    }

    for tag in fork.get_tag_array() {
        for id in fork.get_id_array(tag) {
            if mode == Mode::List {
                let name = fork.get_filename(tag, id);
                if name.is_empty() {
                    writeln!(out, "{} {:04x}", tag, id)?;
                } else {
                    writeln!(out, "{} {:04x} - {}", tag, id, name)?;
                }
                summary.listed += 1;
                continue;
            }

            let file_name = options.output_dir.join(fork.create_output_filename(options.use_file_names, tag, id));
            let kind = match mode {
                Mode::Convert => options.resource_kind(tag),
                _ => ResourceKind::Dump
            };
            match convert_resource(fork, kind, tag, id, &file_name) {
                Some(Ok(path)) => {
                    info!("{} {:04x} -> {}", tag, id, path.display());
                    summary.written += 1;
                },
                Some(Err(err)) => {
                    warn!("{} {:04x}: not written: {:?}", tag, id, err);
                    summary.failed += 1;
                },
                None => summary.skipped += 1,
            }
        }
    }

    if mode == Mode::Convert {
        match icon::output_icons(fork, &options.output_dir, |tag| options.resource_kind(tag) == ResourceKind::IconMember) {
            Ok(written) => {
                for path in &written {
                    info!("icon family -> {}", path.display());
                }
                summary.written += written.len();
            },
            Err(err) => {
                warn!("icon families not written: {:?}", err);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
