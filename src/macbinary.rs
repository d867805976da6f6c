use byteorder::{BigEndian, ByteOrder};
use std::io::{Read, Seek, SeekFrom};

use crate::resfork::{ForkError, ForkSpan, ReadSeek};
use crate::util;

pub const HEADER_SIZE: usize = 128;
const MAX_NAME_LENGTH: u8 = 63;

/// The fields of the 128 byte MacBinary header needed to find the forks.
pub struct MacBinaryHeader {
    pub name_length: u8,
    pub data_length: u32,
    pub rsrc_length: u32,
    pub secondary_header_length: u16,
    /// Writer and minimum reader versions, both zero in MacBinary I.
    pub version: u8,
    pub min_version: u8,
    pub crc: u16,
}

impl MacBinaryHeader {
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<MacBinaryHeader, ForkError> {
        // version byte and the two zero fillers
        if raw[0] != 0 || raw[74] != 0 || raw[82] != 0 {
            return Err(ForkError::NotAContainer("MacBinary zero fields are set"))
        }

        let header = MacBinaryHeader{
            name_length: raw[1],
            data_length: BigEndian::read_u32(&raw[83..87]),
            rsrc_length: BigEndian::read_u32(&raw[87..91]),
            secondary_header_length: BigEndian::read_u16(&raw[120..122]),
            version: raw[122],
            min_version: raw[123],
            crc: BigEndian::read_u16(&raw[124..126]),
        };
        if header.name_length == 0 || header.name_length > MAX_NAME_LENGTH {
            return Err(ForkError::NotAContainer("MacBinary filename length"))
        }
        if header.has_crc() && crc16_xmodem(&raw[..124]) != header.crc {
            return Err(ForkError::NotAContainer("MacBinary CRC mismatch"))
        }
        Ok(header)
    }

    /// MacBinary I leaves the version bytes and the CRC word zero.
    pub fn has_crc(&self) -> bool {
        self.version != 0 || self.min_version != 0 || self.crc != 0
    }

    /// Forks follow the header, each padded to a 128 byte block.
    pub fn rsrc_offset(&self) -> u64 {
        HEADER_SIZE as u64
            + util::pad_to_block(self.secondary_header_length as u64)
            + util::pad_to_block(self.data_length as u64)
    }
}

pub fn locate_fork(source: &mut dyn ReadSeek, length: u64) -> Result<ForkSpan, ForkError> {
    if length < HEADER_SIZE as u64 {
        return Err(ForkError::NotAContainer("too short for MacBinary"))
    }
    let mut raw = [ 0u8; HEADER_SIZE ];
    source.seek(SeekFrom::Start(0))?;
    source.read_exact(&mut raw)?;

    let header = MacBinaryHeader::parse(&raw)?;
    if header.rsrc_length == 0 {
        return Err(ForkError::NotAContainer("MacBinary file without resource fork"))
    }
    let span = ForkSpan{ offset: header.rsrc_offset(), length: header.rsrc_length as u64 };
    if span.offset + span.length > length {
        return Err(ForkError::OutOfBounds("MacBinary resource fork"))
    }
    Ok(span)
}

/// CRC-16/XMODEM as used by MacBinary II and later.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if (crc & 0x8000) != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}
