use packed_struct::prelude::*;
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::restype::Tag;
use crate::{appledouble, macbinary, util};

#[derive(Debug)]
pub enum ForkError {
    IoError(std::io::Error),
    NotFound(PathBuf),
    NotAContainer(&'static str),
    OutOfBounds(&'static str),
    InvalidHeader,
}

impl From<std::io::Error> for ForkError {
    fn from(error: std::io::Error) -> Self {
       ForkError::IoError(error)
    }
}

pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

#[derive(Debug,PartialEq,Eq,Clone,Copy)]
pub enum ContainerFormat {
    RawFork,
    MacBinary,
    AppleSingle,
    AppleDouble,
}

/// Absolute position and size of a classic resource fork inside a file.
#[derive(Debug,PartialEq,Eq,Clone,Copy)]
pub struct ForkSpan {
    pub offset: u64,
    pub length: u64,
}

/// Inspects a byte source of the given length and locates the fork inside
/// it, or explains why this interpretation does not apply.
pub type Probe = fn(&mut dyn ReadSeek, u64) -> Result<ForkSpan, ForkError>;

const IN_FILE_PROBES: [(ContainerFormat, Probe); 3] = [
    (ContainerFormat::RawFork, probe_raw_fork),
    (ContainerFormat::MacBinary, macbinary::locate_fork),
    (ContainerFormat::AppleSingle, appledouble::locate_single_fork),
];

pub const FORK_HEADER_SIZE: u64 = 16;
// preamble copy, next map handle, file ref, attributes, type and name list offsets
const MAP_HEADER_SIZE: usize = 28;
const TYPE_ENTRY_SIZE: u64 = 8;
const REFERENCE_ENTRY_SIZE: u64 = 12;
const NO_NAME: u16 = 0xffff;

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct ForkHeader {
    pub data_offset: u32,
    pub map_offset: u32,
    pub data_length: u32,
    pub map_length: u32,
}

#[derive(Debug,Clone,PartialEq,Eq)]
pub struct ResourceForkID {
    pub id: u16,
    /// Empty when the resource is unnamed.
    pub name: String,
    /// Relative to the start of the data section.
    pub offset: u32,
}

#[derive(Debug,Clone,PartialEq,Eq)]
pub struct ResourceForkType {
    pub tag: Tag,
    pub ids: Vec<ResourceForkID>,
}

/// Result of a successful map parse, before it is attached to a fork.
pub struct ParsedMap {
    pub data_start: u64,
    pub data_length: u64,
    pub types: Vec<ResourceForkType>,
}

pub struct ResourceFork {
    pub(crate) source: Option<Box<dyn ReadSeek>>,
    format: Option<ContainerFormat>,
    pub(crate) data_start: u64,
    pub(crate) data_length: u64,
    pub(crate) types: Vec<ResourceForkType>,
}

impl ResourceFork {
    pub fn new() -> Self {
        ResourceFork{ source: None, format: None, data_start: 0, data_length: 0, types: Vec::new() }
    }

    /// Opens `path` as a raw fork, MacBinary or AppleSingle file, then tries
    /// its AppleDouble sidecars, then repeats all of that for sibling file
    /// names. On failure the fork is left closed.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ForkError> {
        self.close();

        let path = path.as_ref();
        let mut error = ForkError::NotFound(path.to_path_buf());
        let candidates = std::iter::once(path.to_path_buf()).chain(alternate_filenames(path));
        for candidate in candidates {
            match self.load_candidate(&candidate) {
                Ok(()) => return Ok(()),
                Err(ForkError::NotFound(_)) => { },
                Err(err) => {
                    debug!("{}: {:?}", candidate.display(), err);
                    keep_more_specific(&mut error, err);
                }
            }
        }
        Err(error)
    }

    /// Loads from an arbitrary byte source holding a raw fork, a MacBinary
    /// file or an AppleSingle file.
    pub fn load_from<R: Read + Seek + 'static>(&mut self, reader: R) -> Result<(), ForkError> {
        self.close();
        self.load_from_probes(Box::new(reader))
    }

    pub fn close(&mut self) {
        self.source = None;
        self.format = None;
        self.data_start = 0;
        self.data_length = 0;
        self.types.clear();
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    pub fn format(&self) -> Option<ContainerFormat> {
        self.format
    }

    pub fn types(&self) -> &[ResourceForkType] {
        &self.types
    }

    fn load_candidate(&mut self, path: &Path) -> Result<(), ForkError> {
        let mut error = ForkError::NotFound(path.to_path_buf());

        if path.is_file() {
            let file = File::open(path)?;
            match self.load_from_probes(Box::new(file)) {
                Ok(()) => {
                    info!("{}: loaded {:?}", path.display(), self.format);
                    return Ok(())
                },
                Err(err) => keep_more_specific(&mut error, err),
            }
        }

        for sidecar in appledouble::sidecar_filenames(path) {
            if !sidecar.is_file() { continue; }

            let mut file = File::open(&sidecar)?;
            match try_probe(&mut file, appledouble::locate_double_fork) {
                Ok(parsed) => {
                    info!("{}: loaded AppleDouble sidecar {}", path.display(), sidecar.display());
                    self.attach(Box::new(file), ContainerFormat::AppleDouble, parsed);
                    return Ok(())
                },
                Err(err) => {
                    debug!("{}: not an AppleDouble sidecar: {:?}", sidecar.display(), err);
                    keep_more_specific(&mut error, err);
                }
            }
        }
        Err(error)
    }

    /// Runs the in-file probes in order. When all fail, a wrapper that
    /// recognised its own header explains the failure better than the raw
    /// probe, which accepts any file long enough to hold a preamble.
    fn load_from_probes(&mut self, mut source: Box<dyn ReadSeek>) -> Result<(), ForkError> {
        let mut raw_error: Option<ForkError> = None;
        let mut wrapper_error: Option<ForkError> = None;
        for (format, probe) in IN_FILE_PROBES.iter() {
            match try_probe(&mut *source, *probe) {
                Ok(parsed) => {
                    self.attach(source, *format, parsed);
                    return Ok(())
                },
                Err(err) => {
                    debug!("{:?} probe rejected: {:?}", format, err);
                    let recognised = !matches!(err, ForkError::NotAContainer(_));
                    if *format == ContainerFormat::RawFork {
                        raw_error = Some(err);
                    } else if recognised && wrapper_error.is_none() {
                        wrapper_error = Some(err);
                    }
                }
            }
        }
        Err(wrapper_error.or(raw_error).unwrap_or(ForkError::NotAContainer("no probe matched")))
    }

    fn attach(&mut self, source: Box<dyn ReadSeek>, format: ContainerFormat, parsed: ParsedMap) {
        self.source = Some(source);
        self.format = Some(format);
        self.data_start = parsed.data_start;
        self.data_length = parsed.data_length;
        self.types = parsed.types;
    }
}

impl Default for ResourceFork {
    fn default() -> Self {
        ResourceFork::new()
    }
}

/// A candidate that held a damaged container says more than one that was
/// missing or held no container at all.
fn keep_more_specific(error: &mut ForkError, candidate: ForkError) {
    let replace = match error {
        ForkError::NotFound(_) | ForkError::NotAContainer(_) => !matches!(candidate, ForkError::NotFound(_)),
        _ => false
    };
    if replace {
        *error = candidate;
    }
}

fn try_probe(source: &mut dyn ReadSeek, probe: Probe) -> Result<ParsedMap, ForkError> {
    let length = source.seek(SeekFrom::End(0))?;
    let span = probe(source, length)?;
    load_internal(source, span)
}

fn probe_raw_fork(_source: &mut dyn ReadSeek, length: u64) -> Result<ForkSpan, ForkError> {
    if length < FORK_HEADER_SIZE {
        return Err(ForkError::NotAContainer("too short for a resource fork"))
    }
    Ok(ForkSpan{ offset: 0, length })
}

/// Parses the classic fork starting at `span.offset`. All section offsets
/// are checked against `span.length` before anything is read from them.
pub fn load_internal(source: &mut dyn ReadSeek, span: ForkSpan) -> Result<ParsedMap, ForkError> {
    if span.length < FORK_HEADER_SIZE {
        return Err(ForkError::OutOfBounds("fork header"))
    }
    source.seek(SeekFrom::Start(span.offset))?;
    let mut raw_header = [ 0u8; FORK_HEADER_SIZE as usize ];
    source.read_exact(&mut raw_header)?;
    let header = ForkHeader::unpack_from_slice(&raw_header).map_err(|_| ForkError::InvalidHeader)?;

    let data_offset = header.data_offset as u64;
    let map_offset = header.map_offset as u64;
    if data_offset < FORK_HEADER_SIZE || map_offset < FORK_HEADER_SIZE {
        return Err(ForkError::NotAContainer("section overlaps fork header"))
    }
    if data_offset + header.data_length as u64 > span.length {
        return Err(ForkError::OutOfBounds("data section"))
    }
    if map_offset + header.map_length as u64 > span.length {
        return Err(ForkError::OutOfBounds("map section"))
    }
    if (header.map_length as usize) < MAP_HEADER_SIZE + 2 {
        return Err(ForkError::OutOfBounds("map header"))
    }

    let mut map = vec![ 0u8; header.map_length as usize ];
    source.seek(SeekFrom::Start(span.offset + map_offset))?;
    source.read_exact(&mut map)?;

    let types = parse_map(&map, header.data_length)?;
    debug!("fork at {}: {} type(s), data at {} ({} bytes)", span.offset, types.len(), data_offset, header.data_length);
    Ok(ParsedMap{ data_start: span.offset + data_offset, data_length: header.data_length as u64, types })
}

fn parse_map(map: &[u8], data_length: u32) -> Result<Vec<ResourceForkType>, ForkError> {
    let type_list = util::read_u16_be(map, 24).ok_or(ForkError::OutOfBounds("map header"))? as u64;
    let name_list = util::read_u16_be(map, 26).ok_or(ForkError::OutOfBounds("map header"))? as usize;

    let mut rdr = Cursor::new(map);
    rdr.seek(SeekFrom::Start(type_list))?;
    let num_types = rdr.read_u16::<BigEndian>().map_err(|_| ForkError::OutOfBounds("type list"))?.wrapping_add(1);
    if type_list + 2 + num_types as u64 * TYPE_ENTRY_SIZE > map.len() as u64 {
        return Err(ForkError::OutOfBounds("type list"))
    }
    // reference lists are never shared, so all of them together fit in the map
    let mut total_ids: u64 = 0;

    let mut types: Vec<ResourceForkType> = Vec::with_capacity(num_types as usize);
    for n in 0..num_types as u64 {
        rdr.seek(SeekFrom::Start(type_list + 2 + n * TYPE_ENTRY_SIZE))?;
        let tag = rdr.read_u32::<BigEndian>().map_err(|_| ForkError::OutOfBounds("type list"))?;
        let num_ids = rdr.read_u16::<BigEndian>().map_err(|_| ForkError::OutOfBounds("type list"))?.wrapping_add(1);
        let ref_list = rdr.read_u16::<BigEndian>().map_err(|_| ForkError::OutOfBounds("type list"))? as u64;
        total_ids += num_ids as u64;
        if type_list + ref_list + num_ids as u64 * REFERENCE_ENTRY_SIZE > map.len() as u64
            || total_ids * REFERENCE_ENTRY_SIZE > map.len() as u64 {
            return Err(ForkError::OutOfBounds("reference list"))
        }

        let mut ids: Vec<ResourceForkID> = Vec::with_capacity(num_ids as usize);
        for m in 0..num_ids as u64 {
            rdr.seek(SeekFrom::Start(type_list + ref_list + m * REFERENCE_ENTRY_SIZE))?;
            let id = rdr.read_u16::<BigEndian>().map_err(|_| ForkError::OutOfBounds("reference list"))?;
            let name_offset = rdr.read_u16::<BigEndian>().map_err(|_| ForkError::OutOfBounds("reference list"))?;
            let _attributes = rdr.read_u8().map_err(|_| ForkError::OutOfBounds("reference list"))?;
            let offset = rdr.read_u24::<BigEndian>().map_err(|_| ForkError::OutOfBounds("reference list"))?;
            rdr.read_u32::<BigEndian>().map_err(|_| ForkError::OutOfBounds("reference list"))?; // handle

            if offset as u64 + 4 > data_length as u64 {
                return Err(ForkError::OutOfBounds("resource data offset"))
            }

            let name = if name_offset == NO_NAME {
                String::new()
            } else {
                util::read_pascal_string(map, name_list + name_offset as usize)
                    .ok_or(ForkError::OutOfBounds("name list"))?
            };
            ids.push(ResourceForkID{ id, name, offset });
        }
        types.push(ResourceForkType{ tag: Tag(tag), ids });
    }
    Ok(types)
}

/// Sibling names worth trying when `path` itself yields no fork.
fn alternate_filenames(path: &Path) -> Vec<PathBuf> {
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Vec::new()
    };

    let mut names = vec![ format!("{}.rsrc", file_name), format!("{}.bin", file_name) ];
    for suffix in &[ ".bin", ".rsrc" ] {
        if file_name.len() > suffix.len() && util::ends_with_ignore_case(file_name, suffix) {
            names.push(file_name[..file_name.len() - suffix.len()].to_string());
        }
    }
    names.push(file_name.to_lowercase());
    names.push(file_name.to_uppercase());

    let mut candidates: Vec<PathBuf> = Vec::new();
    for name in names {
        let candidate = path.with_file_name(name);
        if candidate != path && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}
