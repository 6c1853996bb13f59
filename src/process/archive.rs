// src/process/archive.rs
use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{ExtractError, Result};

/// Open a compressed market-summary archive and return the bytes of its
/// listing entry: the first `.lis` entry, else the first file entry.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_listing<P: AsRef<Path>>(path: P) -> Result<(String, Vec<u8>)> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ExtractError::MissingResource(format!(
            "archive {} does not exist",
            path.display()
        )));
    }
    let file = File::open(path)?;
    read_listing_from(file)
}

pub fn read_listing_from<R: Read + Seek>(reader: R) -> Result<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(reader)?;

    let mut chosen: Option<usize> = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.is_file() {
            continue;
        }
        if entry.name().to_lowercase().ends_with(".lis") {
            chosen = Some(i);
            break;
        }
        chosen.get_or_insert(i);
    }

    let idx = chosen
        .ok_or_else(|| ExtractError::MissingResource("archive holds no file entries".into()))?;
    let mut entry = archive.by_index(idx)?;
    let name = entry.name().to_string();
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    debug!(entry = %name, bytes = buf.len(), "read listing from archive");
    Ok((name, buf))
}
