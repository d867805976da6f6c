use phf::phf_map;
use std::fmt;
use std::str::FromStr;

/// A four character resource type code, stored big-endian (`'PICT'`).
#[derive(PartialEq,Eq,Hash,Clone,Copy,PartialOrd,Ord)]
pub struct Tag(pub u32);

impl Tag {
    pub const fn from_bytes(bytes: [u8; 4]) -> Tag {
        Tag(u32::from_be_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Type codes are Mac OS Roman, but everything we match on is ASCII.
    pub fn as_string(self) -> String {
        self.to_bytes().iter().map(|&b| b as char).collect()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}'", self.as_string())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidTag(pub String);

impl FromStr for Tag {
    type Err = InvalidTag;

    /// Shorter codes are padded with spaces, so `snd` is `'snd '`.
    fn from_str(s: &str) -> Result<Tag, InvalidTag> {
        if s.is_empty() || s.len() > 4 || !s.is_ascii() {
            return Err(InvalidTag(s.to_string()));
        }
        let mut bytes = [ b' '; 4 ];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Tag::from_bytes(bytes))
    }
}

/// What `convert` does with a resource of a given type.
#[derive(Debug,PartialEq,Eq,Hash,Clone,Copy)]
pub enum ResourceKind {
    Skip,
    Dump,
    Picture,
    Sound,
    Jpeg,
    IconMember,
}

static RESOURCE_KIND_MAP: phf::Map<&'static str, ResourceKind> = phf_map!{
    "PICT" => ResourceKind::Picture,
    "IBIN" => ResourceKind::Picture,
    "IBIS" => ResourceKind::Picture,
    "snd " => ResourceKind::Sound,
    "JPEG" => ResourceKind::Jpeg,
    "j3rs" => ResourceKind::Jpeg,
    "ICON" => ResourceKind::IconMember,
    "ICN#" => ResourceKind::IconMember,
    "icl4" => ResourceKind::IconMember,
    "icl8" => ResourceKind::IconMember,
    "ics#" => ResourceKind::IconMember,
    "ics4" => ResourceKind::IconMember,
    "ics8" => ResourceKind::IconMember,
    "icm#" => ResourceKind::IconMember,
    "icm4" => ResourceKind::IconMember,
    "icm8" => ResourceKind::IconMember,
    "ich#" => ResourceKind::IconMember,
    "ich4" => ResourceKind::IconMember,
    "ich8" => ResourceKind::IconMember,
    "is32" => ResourceKind::IconMember,
    "s8mk" => ResourceKind::IconMember,
    "il32" => ResourceKind::IconMember,
    "l8mk" => ResourceKind::IconMember,
    "ih32" => ResourceKind::IconMember,
    "h8mk" => ResourceKind::IconMember,
    "it32" => ResourceKind::IconMember,
    "t8mk" => ResourceKind::IconMember,
};

/// Built-in converter for `tag`; anything unlisted is dumped as-is.
pub fn default_resource_kind(tag: Tag) -> ResourceKind {
    RESOURCE_KIND_MAP.get(tag.as_string().as_str()).copied().unwrap_or(ResourceKind::Dump)
}

pub fn is_icon_tag(tag: Tag) -> bool {
    default_resource_kind(tag) == ResourceKind::IconMember
}

pub fn resource_kind_to_str(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Skip => "skip",
        ResourceKind::Dump => "dump",
        ResourceKind::Picture => "pict",
        ResourceKind::Sound => "snd",
        ResourceKind::Jpeg => "jpeg",
        ResourceKind::IconMember => "icon",
    }
}

pub fn str_to_resource_kind(s: &str) -> Option<ResourceKind> {
    match s {
        "skip" => Some(ResourceKind::Skip),
        "dump" => Some(ResourceKind::Dump),
        "pict" => Some(ResourceKind::Picture),
        "snd" => Some(ResourceKind::Sound),
        "jpeg" => Some(ResourceKind::Jpeg),
        "icon" => Some(ResourceKind::IconMember),
        _ => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_text() {
        let tag = Tag::from_bytes(*b"snd ");
        assert_eq!(tag.0, 0x736e6420);
        assert_eq!(tag.to_string(), "snd ");
        assert_eq!("snd".parse::<Tag>(), Ok(tag));
        assert_eq!("PICT".parse::<Tag>(), Ok(Tag::from_bytes(*b"PICT")));
        assert!("TOOLONG".parse::<Tag>().is_err());
        assert!("".parse::<Tag>().is_err());
    }

    #[test]
    fn kind_table() {
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"PICT")), ResourceKind::Picture);
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"snd ")), ResourceKind::Sound);
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"JPEG")), ResourceKind::Jpeg);
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"icl8")), ResourceKind::IconMember);
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"STR#")), ResourceKind::Dump);
        // case matters for type codes
        assert_eq!(default_resource_kind(Tag::from_bytes(*b"pict")), ResourceKind::Dump);
    }

    #[test]
    fn icon_allow_list() {
        let icons = RESOURCE_KIND_MAP.entries()
            .filter(|(_, kind)| **kind == ResourceKind::IconMember)
            .count();
        assert_eq!(icons, 21);
        assert!(is_icon_tag(Tag::from_bytes(*b"ICN#")));
        assert!(!is_icon_tag(Tag::from_bytes(*b"PICT")));
    }

    #[test]
    fn kind_names() {
        for kind in &[ ResourceKind::Skip, ResourceKind::Dump, ResourceKind::Picture,
                       ResourceKind::Sound, ResourceKind::Jpeg, ResourceKind::IconMember ] {
            assert_eq!(str_to_resource_kind(resource_kind_to_str(*kind)), Some(*kind));
        }
        assert_eq!(str_to_resource_kind("wav"), None);
    }
}
