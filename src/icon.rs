use icns::{IconElement, OSType};
use indexmap::IndexMap;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::convert::{self, ConvertError};
use crate::resfork::ResourceFork;
use crate::resource::ResourceKey;
use crate::restype::Tag;

/// All variants of one icon, sharing a resource id.
#[derive(Debug,PartialEq,Eq)]
pub struct IconFamily {
    pub id: u16,
    pub variants: Vec<(Tag, Vec<u8>)>,
}

/// Gathers every non-empty resource whose tag passes `is_member`, grouped
/// by id. Families come back sorted by id, variants in fork order.
pub fn collect_icon_families<F: Fn(Tag) -> bool>(fork: &mut ResourceFork, is_member: F) -> Vec<IconFamily> {
    let mut families: IndexMap<u16, Vec<(Tag, Vec<u8>)>> = IndexMap::new();
    for tag in fork.get_tag_array() {
        if !is_member(tag) { continue; }

        for id in fork.get_id_array(tag) {
            match fork.get_resource(ResourceKey::Id(tag, id)) {
                Some(res) if !res.is_empty() => {
                    families.entry(id).or_insert_with(Vec::new).push((tag, res.data));
                },
                _ => debug!("{} {:04x}: skipped, no icon data", tag, id)
            }
        }
    }
    families.sort_keys();
    families.into_iter().map(|(id, variants)| IconFamily{ id, variants }).collect()
}

/// Serializes a family as an Apple icon image, one element per variant.
/// The classic variants are stored as they are; nothing is re-encoded.
pub fn write_icns<W: Write>(out: &mut W, family: &IconFamily) -> std::io::Result<()> {
    let mut icns = icns::IconFamily::new();
    for (tag, data) in &family.variants {
        icns.elements.push(IconElement::new(OSType(tag.to_bytes()), data.clone()));
    }
    icns.write(out)
}

pub fn icns_filename(id: u16) -> String {
    format!("{:04x}.icns", id)
}

/// Writes one `.icns` per icon id into `output_dir`. An empty result means
/// the fork holds no icons.
pub fn output_icons<F: Fn(Tag) -> bool>(fork: &mut ResourceFork, output_dir: &Path, is_member: F) -> Result<Vec<PathBuf>, ConvertError> {
    let families = collect_icon_families(fork, is_member);
    if families.is_empty() {
        info!("no icon resources found");
        return Ok(Vec::new())
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(families.len());
    for family in &families {
        let path = output_dir.join(icns_filename(family.id));
        debug!("{}: {} variant(s)", path.display(), family.variants.len());
        let mut icns: Vec<u8> = Vec::new();
        write_icns(&mut icns, family)?;
        written.push(convert::write_output(&path, &icns)?);
    }
    Ok(written)
}
