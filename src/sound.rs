use packed_struct::prelude::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::convert::{self, ConvertError};
use crate::resource::ResourceData;

#[derive(Debug)]
pub enum SoundError {
    IoError(std::io::Error),
    UnsupportedFormat(u16),
    UnsupportedReferenceCount(u16),
    UnsupportedCommandCount(u16),
    UnsupportedCommand(u16),
    UnsupportedHeader(u32),
    UnsupportedEncoding(u8),
    OutOfBounds,
}

impl From<std::io::Error> for SoundError {
    fn from(error: std::io::Error) -> Self {
       SoundError::IoError(error)
    }
}

#[derive(TryFromPrimitive)]
#[derive(Debug)]
#[repr(u16)]
enum SoundFormat {
    Format1 = 1,
    Format2 = 2,
}

// high bit set: param2 is an offset into the resource
#[derive(TryFromPrimitive)]
#[derive(Debug)]
#[repr(u16)]
enum SoundCommand {
    SoundCmd = 0x8050,
    BufferCmd = 0x8051,
}

const SOUND_HEADER_SIZE: usize = 22;
const WAVE_FORMAT_PCM: u16 = 1;
const WAV_HEADER_SIZE: u32 = 44;

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct StandardSoundHeader {
    pub sample_ptr: u32,
    pub length: u32,
    pub sample_rate: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub encode: u8,
    pub base_frequency: u8,
}

/// 8-bit unsigned mono PCM taken from a `snd ` resource.
pub struct SampledSound<'a> {
    pub sample_rate: u16,
    pub samples: &'a [u8],
}

fn sound_header_offset(data: &[u8]) -> Result<usize, SoundError> {
    let mut rdr = Cursor::new(data);
    let format = rdr.read_u16::<BigEndian>()?;

    let offset = match SoundFormat::try_from(format) {
        Ok(SoundFormat::Format1) => {
            let num_data_formats = rdr.read_u16::<BigEndian>()?;
            rdr.seek(SeekFrom::Current(6 * num_data_formats as i64))?; // type + init options
            let num_commands = rdr.read_u16::<BigEndian>()?;
            if num_commands == 0 {
                return Err(SoundError::UnsupportedCommandCount(num_commands))
            }
            rdr.seek(SeekFrom::Current(4))?; // command, param1
            rdr.read_u32::<BigEndian>()?
        },
        Ok(SoundFormat::Format2) => {
            let reference_count = rdr.read_u16::<BigEndian>()?;
            if reference_count != 0 {
                return Err(SoundError::UnsupportedReferenceCount(reference_count))
            }
            let num_commands = rdr.read_u16::<BigEndian>()?;
            if num_commands != 1 {
                return Err(SoundError::UnsupportedCommandCount(num_commands))
            }
            let command = rdr.read_u16::<BigEndian>()?;
            SoundCommand::try_from(command).map_err(|_| SoundError::UnsupportedCommand(command))?;
            rdr.seek(SeekFrom::Current(2))?; // param1
            rdr.read_u32::<BigEndian>()?
        },
        Err(_) => return Err(SoundError::UnsupportedFormat(format))
    };
    Ok(offset as usize)
}

/// Locates the standard sound header and its samples. Only uncompressed
/// 8-bit sounds are accepted.
pub fn decode_snd(data: &[u8]) -> Result<SampledSound, SoundError> {
    let offset = sound_header_offset(data)?;
    let raw = data.get(offset..offset.saturating_add(SOUND_HEADER_SIZE)).ok_or(SoundError::OutOfBounds)?;
    let header = StandardSoundHeader::unpack_from_slice(raw).map_err(|_| SoundError::OutOfBounds)?;

    if header.sample_ptr != 0 {
        return Err(SoundError::UnsupportedHeader(header.sample_ptr))
    }
    if header.encode != 0 {
        return Err(SoundError::UnsupportedEncoding(header.encode))
    }

    let start = offset + SOUND_HEADER_SIZE;
    let samples = data.get(start..start.saturating_add(header.length as usize)).ok_or(SoundError::OutOfBounds)?;
    // sample rate is 16.16 fixed point
    Ok(SampledSound{ sample_rate: (header.sample_rate >> 16) as u16, samples })
}

pub fn write_wav<W: Write>(out: &mut W, sound: &SampledSound) -> std::io::Result<()> {
    let length = sound.samples.len() as u32;
    let rate = sound.sample_rate as u32;

    out.write_all(b"RIFF")?;
    out.write_u32::<LittleEndian>(length + WAV_HEADER_SIZE - 8)?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_u32::<LittleEndian>(16)?;
    out.write_u16::<LittleEndian>(WAVE_FORMAT_PCM)?;
    out.write_u16::<LittleEndian>(1)?; // channels
    out.write_u32::<LittleEndian>(rate)?;
    out.write_u32::<LittleEndian>(rate)?; // byte rate
    out.write_u16::<LittleEndian>(1)?; // block align
    out.write_u16::<LittleEndian>(8)?; // bits per sample

    out.write_all(b"data")?;
    out.write_u32::<LittleEndian>(length)?;
    out.write_all(sound.samples)
}

pub fn snd_to_wav(data: &[u8]) -> Result<Vec<u8>, SoundError> {
    let sound = decode_snd(data)?;
    let mut wav: Vec<u8> = Vec::with_capacity(WAV_HEADER_SIZE as usize + sound.samples.len());
    write_wav(&mut wav, &sound)?;
    Ok(wav)
}

/// Writes `pair` as `<file_name>.wav`. Nothing is created if the resource
/// cannot be decoded.
pub fn output_snd(pair: Option<&ResourceData>, file_name: &Path) -> Result<PathBuf, ConvertError> {
    let pair = pair.ok_or(ConvertError::MissingInput)?;
    let path = convert::output_path(file_name, ".wav")?;
    let wav = snd_to_wav(&pair.data)?;
    convert::write_output(&path, &wav)
}
