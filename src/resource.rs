use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, warn};
use std::io::{Read, Seek, SeekFrom};

use crate::resfork::{ResourceFork, ResourceForkID, ResourceForkType};
use crate::restype::Tag;
use crate::util;

/// How a resource is looked up.
#[derive(Debug,Clone,Copy)]
pub enum ResourceKey<'a> {
    Id(Tag, u16),
    /// First resource of any type with this name.
    Name(&'a str),
    TypedName(Tag, &'a str),
}

/// An extracted resource. Every extraction reads the fork again and hands
/// out a new buffer.
#[derive(Debug)]
pub struct ResourceData {
    pub tag: Tag,
    pub id: u16,
    pub data: Vec<u8>,
}

impl ResourceData {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ResourceFork {
    fn find_type(&self, tag: Tag) -> Option<&ResourceForkType> {
        self.types.iter().find(|t| t.tag == tag)
    }

    fn find(&self, key: ResourceKey) -> Option<(Tag, &ResourceForkID)> {
        match key {
            ResourceKey::Id(tag, id) => {
                self.find_type(tag)?.ids.iter().find(|r| r.id == id).map(|r| (tag, r))
            },
            ResourceKey::Name(name) => {
                self.types.iter()
                    .flat_map(|t| t.ids.iter().map(move |r| (t.tag, r)))
                    .find(|(_, r)| !r.name.is_empty() && r.name == name)
            },
            ResourceKey::TypedName(tag, name) => {
                self.find_type(tag)?.ids.iter().find(|r| !r.name.is_empty() && r.name == name).map(|r| (tag, r))
            },
        }
    }

    /// Reads a resource from the fork. Returns `None` if it does not exist
    /// or its length runs past the end of the data section.
    pub fn get_resource(&mut self, key: ResourceKey) -> Option<ResourceData> {
        let (tag, entry) = match self.find(key) {
            Some((tag, entry)) => (tag, entry.clone()),
            None => {
                debug!("no resource for {:?}", key);
                return None
            }
        };

        match self.read_data(entry.offset) {
            Ok(Some(data)) => Some(ResourceData{ tag, id: entry.id, data }),
            Ok(None) => {
                warn!("{} {:04x}: length runs past the data section", tag, entry.id);
                None
            },
            Err(err) => {
                warn!("{} {:04x}: read failed: {}", tag, entry.id, err);
                None
            }
        }
    }

    fn read_data(&mut self, offset: u32) -> std::io::Result<Option<Vec<u8>>> {
        let data_start = self.data_start;
        let data_length = self.data_length;
        let source = match self.source.as_mut() {
            Some(source) => source,
            None => return Ok(None)
        };

        let offset = offset as u64;
        if offset + 4 > data_length {
            return Ok(None)
        }
        source.seek(SeekFrom::Start(data_start + offset))?;
        let length = source.read_u32::<BigEndian>()? as u64;
        if offset + 4 + length > data_length {
            return Ok(None)
        }

        let mut data = vec![ 0u8; length as usize ];
        source.read_exact(&mut data)?;
        Ok(Some(data))
    }

    /// Internal name of a resource, empty if it has none.
    pub fn get_filename(&self, tag: Tag, id: u16) -> String {
        self.find(ResourceKey::Id(tag, id)).map(|(_, r)| r.name.clone()).unwrap_or_default()
    }

    /// Output name for a resource: its internal name if asked for and
    /// usable, `<tag>_<id>.dat` otherwise.
    pub fn create_output_filename(&self, use_file_names: bool, tag: Tag, id: u16) -> String {
        if use_file_names {
            if let Some(name) = util::sanitize_filename(&self.get_filename(tag, id)) {
                return name
            }
        }
        let tag_name: String = tag.as_string()
            .trim_end_matches(' ')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '#' || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{:04x}.dat", tag_name, id)
    }

    pub fn get_tag_array(&self) -> Vec<Tag> {
        self.types.iter().map(|t| t.tag).collect()
    }

    pub fn get_id_array(&self, tag: Tag) -> Vec<u16> {
        self.find_type(tag).map(|t| t.ids.iter().map(|r| r.id).collect()).unwrap_or_default()
    }
}
