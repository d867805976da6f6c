//! AppleSingle and AppleDouble share one header layout: a magic number, a
//! version, 16 filler bytes and a table of typed entries. Entry 2 is the
//! resource fork.

use packed_struct::prelude::*;
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::resfork::{ForkError, ForkSpan, ReadSeek};

pub const APPLESINGLE_MAGIC: u32 = 0x00051600;
pub const APPLEDOUBLE_MAGIC: u32 = 0x00051607;
const VERSION_1: u32 = 0x00010000;
const VERSION_2: u32 = 0x00020000;

const HEADER_SIZE: usize = 26;
const ENTRY_SIZE: usize = 12;

#[derive(TryFromPrimitive)]
#[derive(Debug,PartialEq,Eq,Clone,Copy)]
#[repr(u32)]
pub enum EntryId {
    DataFork = 1,
    ResourceFork = 2,
    RealName = 3,
    Comment = 4,
    IconBW = 5,
    IconColor = 6,
    FileDatesInfo = 8,
    FinderInfo = 9,
    MacintoshFileInfo = 10,
    ProDOSFileInfo = 11,
    MSDOSFileInfo = 12,
    ShortName = 13,
    AFPFileInfo = 14,
    DirectoryID = 15,
}

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct AppleHeader {
    pub magic: u32,
    pub version: u32,
    pub filler: [u8; 16],
    pub num_entries: u16,
}

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct EntryDescriptor {
    pub id: u32,
    pub offset: u32,
    pub length: u32,
}

/// Where an AppleDouble companion of `path` may live: `._name` next to it
/// (Mac OS X, archives), `.AppleDouble/name` (netatalk) and `%name`.
pub fn sidecar_filenames(path: &Path) -> Vec<PathBuf> {
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Vec::new()
    };
    vec![
        path.with_file_name(format!("._{}", file_name)),
        path.with_file_name(".AppleDouble").join(file_name),
        path.with_file_name(format!("%{}", file_name)),
    ]
}

pub fn locate_double_fork(source: &mut dyn ReadSeek, length: u64) -> Result<ForkSpan, ForkError> {
    locate_entry(source, length, APPLEDOUBLE_MAGIC, EntryId::ResourceFork)
}

pub fn locate_single_fork(source: &mut dyn ReadSeek, length: u64) -> Result<ForkSpan, ForkError> {
    locate_entry(source, length, APPLESINGLE_MAGIC, EntryId::ResourceFork)
}

fn locate_entry(source: &mut dyn ReadSeek, length: u64, magic: u32, wanted: EntryId) -> Result<ForkSpan, ForkError> {
    if length < HEADER_SIZE as u64 {
        return Err(ForkError::NotAContainer("too short for AppleSingle/AppleDouble"))
    }
    let mut raw = [ 0u8; HEADER_SIZE ];
    source.seek(SeekFrom::Start(0))?;
    source.read_exact(&mut raw)?;
    let header = AppleHeader::unpack_from_slice(&raw).map_err(|_| ForkError::InvalidHeader)?;
    if header.magic != magic {
        return Err(ForkError::NotAContainer("AppleSingle/AppleDouble magic"))
    }
    if header.version != VERSION_1 && header.version != VERSION_2 {
        return Err(ForkError::NotAContainer("AppleSingle/AppleDouble version"))
    }

    let table_size = header.num_entries as u64 * ENTRY_SIZE as u64;
    if HEADER_SIZE as u64 + table_size > length {
        return Err(ForkError::OutOfBounds("entry table"))
    }

    for _ in 0..header.num_entries {
        let mut raw = [ 0u8; ENTRY_SIZE ];
        source.read_exact(&mut raw)?;
        let entry = EntryDescriptor::unpack_from_slice(&raw).map_err(|_| ForkError::InvalidHeader)?;
        if EntryId::try_from(entry.id).ok() != Some(wanted) {
            continue;
        }

        let span = ForkSpan{ offset: entry.offset as u64, length: entry.length as u64 };
        if span.offset + span.length > length {
            return Err(ForkError::OutOfBounds("resource fork entry"))
        }
        return Ok(span)
    }
    Err(ForkError::NotAContainer("no resource fork entry"))
}
