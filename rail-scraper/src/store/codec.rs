//! JSON file codec, plain and gzip-compressed.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::StoreError;

/// Read a gzip-compressed JSON file.
pub fn read_gz_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(BufReader::new(decoder)).map_err(|e| {
        // Corrupt gzip streams surface as I/O errors inside serde_json.
        if e.is_io() {
            StoreError::io(path, std::io::Error::other(e.to_string()))
        } else {
            StoreError::json(path, e)
        }
    })
}

/// Read an uncompressed JSON file.
pub fn read_plain_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(path, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    Ok(())
}

/// Run `encode` against a temporary sibling of `path`, then rename it into
/// place. Returns the size of the final file.
fn write_replacing(
    path: &Path,
    encode: impl FnOnce(BufWriter<File>) -> std::io::Result<()>,
) -> Result<u64, StoreError> {
    ensure_parent(path)?;

    let tmp = tmp_path(path);
    let file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    encode(BufWriter::new(file)).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;

    let meta = fs::metadata(path).map_err(|e| StoreError::io(path, e))?;
    Ok(meta.len())
}

/// Write compact JSON compressed with gzip. Returns the compressed size.
pub fn write_gz_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<u64, StoreError> {
    let json = serde_json::to_vec(value).map_err(|e| StoreError::json(path, e))?;

    write_replacing(path, |writer| {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(&json)?;
        let mut writer = encoder.finish()?;
        writer.flush()
    })
}

/// Pretty-printed JSON, as written to the plain mirror.
pub fn to_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))
}

/// Write already-encoded JSON bytes. Returns the file size.
pub fn write_plain_bytes(path: &Path, json: &[u8]) -> Result<u64, StoreError> {
    write_replacing(path, |mut writer| {
        writer.write_all(json)?;
        writer.flush()
    })
}
