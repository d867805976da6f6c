use byteorder::{BigEndian, ByteOrder};
use encoding_rs::MACINTOSH;

pub fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset.checked_add(2)?).map(BigEndian::read_u16)
}

pub fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset.checked_add(4)?).map(BigEndian::read_u32)
}

/// Decodes the length-prefixed Mac OS Roman string at `offset`. Returns
/// `None` if the length byte or any of the characters lie outside `data`.
pub fn read_pascal_string(data: &[u8], offset: usize) -> Option<String> {
    let len = *data.get(offset)? as usize;
    let bytes = data.get(offset + 1..offset + 1 + len)?;
    let (name, _) = MACINTOSH.decode_without_bom_handling(bytes);
    Some(name.into_owned())
}

pub fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.is_char_boundary(s.len() - suffix.len())
        && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Drops a trailing `.dat` and appends `extension` unless the name already
/// ends with it.
pub fn add_extension(file_name: &str, extension: &str) -> String {
    let mut name = file_name;
    if name.len() > 4 && ends_with_ignore_case(name, ".dat") {
        name = &name[..name.len() - 4];
    }

    if ends_with_ignore_case(name, extension) {
        name.to_string()
    } else {
        format!("{}{}", name, extension)
    }
}

/// Makes a resource name usable as a single path component. Returns `None`
/// if nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let clean: String = name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c
        })
        .collect();
    let trimmed = clean.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Rounds `len` up to the next multiple of 128 (MacBinary block size).
pub fn pad_to_block(len: u64) -> u64 {
    (len + 127) & !127
}
