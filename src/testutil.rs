//! Fixtures for the unit tests: synthesized resource forks, the container
//! encodings wrapping them, and `snd ` resources.

use byteorder::{BigEndian, WriteBytesExt};

use crate::macbinary;

pub const DATA_OFFSET: usize = 256;
const MAP_HEADER_SIZE: usize = 28;

struct Entry {
    id: u16,
    name: Option<String>,
    data: Vec<u8>,
}

/// Builds a raw fork. Types keep the order their first resource was added
/// in, resources keep insertion order within their type.
pub struct ForkBuilder {
    types: Vec<([u8; 4], Vec<Entry>)>,
}

impl ForkBuilder {
    pub fn new() -> Self {
        ForkBuilder{ types: Vec::new() }
    }

    pub fn add(mut self, tag: &[u8; 4], id: u16, name: Option<&str>, data: &[u8]) -> Self {
        let entry = Entry{ id, name: name.map(|n| n.to_string()), data: data.to_vec() };
        match self.types.iter_mut().find(|(t, _)| t == tag) {
            Some((_, entries)) => entries.push(entry),
            None => self.types.push((*tag, vec![ entry ])),
        }
        self
    }

    fn data_length(&self) -> usize {
        self.types.iter().flat_map(|(_, e)| e.iter()).map(|e| 4 + e.data.len()).sum()
    }

    fn map_offset(&self) -> usize {
        DATA_OFFSET + self.data_length()
    }

    fn entries_before(&self, type_index: usize) -> usize {
        self.types[..type_index].iter().map(|(_, e)| e.len()).sum()
    }

    /// Absolute position of a type list entry in the built fork.
    pub fn type_entry_position(&self, type_index: usize) -> usize {
        self.map_offset() + MAP_HEADER_SIZE + 2 + 8 * type_index
    }

    /// Absolute position of a reference list entry in the built fork.
    pub fn reference_entry_position(&self, type_index: usize, id_index: usize) -> usize {
        self.map_offset() + MAP_HEADER_SIZE + 2 + 8 * self.types.len()
            + 12 * (self.entries_before(type_index) + id_index)
    }

    /// Absolute position of a resource's length prefix in the built fork.
    pub fn data_position(&self, type_index: usize, id_index: usize) -> usize {
        let before: usize = self.types.iter()
            .flat_map(|(_, e)| e.iter())
            .take(self.entries_before(type_index) + id_index)
            .map(|e| 4 + e.data.len())
            .sum();
        DATA_OFFSET + before
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data: Vec<u8> = Vec::new();
        let mut names: Vec<u8> = Vec::new();
        let mut references: Vec<u8> = Vec::new();
        let mut type_list: Vec<u8> = Vec::new();

        type_list.write_u16::<BigEndian>((self.types.len() as u16).wrapping_sub(1)).unwrap();
        let mut ref_offset = 2 + 8 * self.types.len();
        for (tag, entries) in &self.types {
            type_list.extend_from_slice(tag);
            type_list.write_u16::<BigEndian>(entries.len() as u16 - 1).unwrap();
            type_list.write_u16::<BigEndian>(ref_offset as u16).unwrap();
            ref_offset += 12 * entries.len();

            for entry in entries {
                let name_offset = match &entry.name {
                    Some(name) => {
                        let offset = names.len() as u16;
                        names.push(name.len() as u8);
                        names.extend_from_slice(name.as_bytes());
                        offset
                    },
                    None => 0xffff
                };
                references.write_u16::<BigEndian>(entry.id).unwrap();
                references.write_u16::<BigEndian>(name_offset).unwrap();
                references.write_u8(0).unwrap();
                references.write_u24::<BigEndian>(data.len() as u32).unwrap();
                references.write_u32::<BigEndian>(0).unwrap();

                data.write_u32::<BigEndian>(entry.data.len() as u32).unwrap();
                data.extend_from_slice(&entry.data);
            }
        }
        type_list.extend_from_slice(&references);

        let map_length = MAP_HEADER_SIZE + type_list.len() + names.len();
        let mut header: Vec<u8> = Vec::new();
        header.write_u32::<BigEndian>(DATA_OFFSET as u32).unwrap();
        header.write_u32::<BigEndian>(self.map_offset() as u32).unwrap();
        header.write_u32::<BigEndian>(data.len() as u32).unwrap();
        header.write_u32::<BigEndian>(map_length as u32).unwrap();

        let mut fork = header.clone();
        fork.resize(DATA_OFFSET, 0);
        fork.extend_from_slice(&data);

        fork.extend_from_slice(&header);
        fork.extend_from_slice(&[ 0u8; 8 ]); // next map, file ref, attributes
        fork.write_u16::<BigEndian>(MAP_HEADER_SIZE as u16).unwrap();
        fork.write_u16::<BigEndian>((MAP_HEADER_SIZE + type_list.len()) as u16).unwrap();
        fork.extend_from_slice(&type_list);
        fork.extend_from_slice(&names);
        fork
    }
}

fn pad_block(out: &mut Vec<u8>) {
    let padded = (out.len() + 127) & !127;
    out.resize(padded, 0);
}

pub fn macbinary_wrap(name: &str, data: &[u8], rsrc: &[u8]) -> Vec<u8> {
    macbinary_encode(name, &[], data, rsrc, 129)
}

/// MacBinary II with a secondary header between the header and the data fork.
pub fn macbinary_wrap_secondary(name: &str, secondary: &[u8], data: &[u8], rsrc: &[u8]) -> Vec<u8> {
    macbinary_encode(name, secondary, data, rsrc, 129)
}

/// MacBinary I: no version bytes and no CRC.
pub fn macbinary1_wrap(name: &str, data: &[u8], rsrc: &[u8]) -> Vec<u8> {
    macbinary_encode(name, &[], data, rsrc, 0)
}

/// Recomputes the header CRC after a test edited the header.
pub fn macbinary_reseal(file: &mut [u8]) {
    let crc = macbinary::crc16_xmodem(&file[..124]);
    file[124..126].copy_from_slice(&crc.to_be_bytes());
}

fn macbinary_encode(name: &str, secondary: &[u8], data: &[u8], rsrc: &[u8], version: u8) -> Vec<u8> {
    let mut header = [ 0u8; 128 ];
    header[1] = name.len() as u8;
    header[2..2 + name.len()].copy_from_slice(name.as_bytes());
    header[65..69].copy_from_slice(b"APPL");
    header[69..73].copy_from_slice(b"????");
    header[83..87].copy_from_slice(&(data.len() as u32).to_be_bytes());
    header[87..91].copy_from_slice(&(rsrc.len() as u32).to_be_bytes());
    header[120..122].copy_from_slice(&(secondary.len() as u16).to_be_bytes());
    header[122] = version;
    header[123] = version;

    let mut out = header.to_vec();
    if version != 0 {
        macbinary_reseal(&mut out);
    }
    out.extend_from_slice(secondary);
    pad_block(&mut out);
    out.extend_from_slice(data);
    pad_block(&mut out);
    out.extend_from_slice(rsrc);
    pad_block(&mut out);
    out
}

fn apple_header(magic: u32, version: u32, entries: &[(u32, usize, usize)]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.write_u32::<BigEndian>(magic).unwrap();
    out.write_u32::<BigEndian>(version).unwrap();
    out.extend_from_slice(&[ 0u8; 16 ]);
    out.write_u16::<BigEndian>(entries.len() as u16).unwrap();
    for (id, offset, length) in entries {
        out.write_u32::<BigEndian>(*id).unwrap();
        out.write_u32::<BigEndian>(*offset as u32).unwrap();
        out.write_u32::<BigEndian>(*length as u32).unwrap();
    }
    out
}

pub fn applesingle_wrap(data: &[u8], rsrc: &[u8]) -> Vec<u8> {
    let start = 26 + 2 * 12;
    let mut out = apple_header(0x00051600, 0x00020000, &[ (1, start, data.len()), (2, start + data.len(), rsrc.len()) ]);
    out.extend_from_slice(data);
    out.extend_from_slice(rsrc);
    out
}

pub fn appledouble_sidecar(rsrc: &[u8]) -> Vec<u8> {
    appledouble_sidecar_version(0x00020000, rsrc)
}

pub fn appledouble_sidecar_version(version: u32, rsrc: &[u8]) -> Vec<u8> {
    let start = 26 + 2 * 12;
    let mut out = apple_header(0x00051607, version, &[ (9, start, 32), (2, start + 32, rsrc.len()) ]);
    out.extend_from_slice(&[ 0u8; 32 ]);
    out.extend_from_slice(rsrc);
    out
}

fn sound_header(out: &mut Vec<u8>, rate: u16, samples: &[u8], encode: u8) {
    out.write_u32::<BigEndian>(0).unwrap(); // samplePtr
    out.write_u32::<BigEndian>(samples.len() as u32).unwrap();
    out.write_u32::<BigEndian>((rate as u32) << 16).unwrap();
    out.write_u32::<BigEndian>(0).unwrap(); // loopStart
    out.write_u32::<BigEndian>(0).unwrap(); // loopEnd
    out.write_u8(encode).unwrap();
    out.write_u8(60).unwrap(); // baseFrequency
    out.extend_from_slice(samples);
}

/// Format 1 `snd ` with one sampled synth data format and one bufferCmd.
pub fn snd_format1(rate: u16, samples: &[u8], encode: u8) -> Vec<u8> {
    snd_format1_with(1, 1, rate, samples, encode)
}

/// Format 1 `snd ` with `data_formats` synth entries and `commands`
/// commands, the first of which points at the sound header.
pub fn snd_format1_with(data_formats: u16, commands: u16, rate: u16, samples: &[u8], encode: u8) -> Vec<u8> {
    let header_offset = 2 + 2 + 6 * data_formats as u32 + 2 + 8 * commands as u32;
    let mut out: Vec<u8> = Vec::new();
    out.write_u16::<BigEndian>(1).unwrap();
    out.write_u16::<BigEndian>(data_formats).unwrap();
    for _ in 0..data_formats {
        out.write_u16::<BigEndian>(5).unwrap(); // sampledSynth
        out.write_u32::<BigEndian>(0x80).unwrap();
    }
    out.write_u16::<BigEndian>(commands).unwrap();
    for n in 0..commands {
        out.write_u16::<BigEndian>(if n == 0 { 0x8051 } else { 0x0003 }).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u32::<BigEndian>(if n == 0 { header_offset } else { 0 }).unwrap();
    }
    sound_header(&mut out, rate, samples, encode);
    out
}

pub fn snd_format2(command: u16, rate: u16, samples: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.write_u16::<BigEndian>(2).unwrap();
    out.write_u16::<BigEndian>(0).unwrap();
    out.write_u16::<BigEndian>(1).unwrap();
    out.write_u16::<BigEndian>(command).unwrap();
    out.write_u16::<BigEndian>(0).unwrap();
    out.write_u32::<BigEndian>(14).unwrap();
    sound_header(&mut out, rate, samples, 0);
    out
}
