use std::path::{Path, PathBuf};

use crate::convert::{self, ConvertError};
use crate::resource::ResourceData;

/// PICT files start with a reserved block that readers skip. It is the only
/// difference from the resource form.
pub const PICT_FILE_HEADER_SIZE: usize = 512;

pub fn pict_file_data(data: &[u8]) -> Vec<u8> {
    let mut out = vec![ 0u8; PICT_FILE_HEADER_SIZE ];
    out.extend_from_slice(data);
    out
}

pub fn output_pict(pair: Option<&ResourceData>, file_name: &Path) -> Result<PathBuf, ConvertError> {
    let pair = pair.ok_or(ConvertError::MissingInput)?;
    let path = convert::output_path(file_name, ".pict")?;
    convert::write_output(&path, &pict_file_data(&pair.data))
}
