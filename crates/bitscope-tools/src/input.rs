use std::fs;
use std::io::{Read, stdin};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn has_gzip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("vgz") || s.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .context("gzip decompression failed")?;
    Ok(out)
}

/// Read the input buffer. `-` reads stdin. Gzip input is detected by a
/// `.gz`/`.vgz` extension or the gzip header and decompressed.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let (data, by_extension) = if path == Path::new("-") {
        let mut inbuf = Vec::new();
        stdin()
            .read_to_end(&mut inbuf)
            .context("failed to read from stdin")?;
        (inbuf, false)
    } else {
        let data = fs::read(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        (data, has_gzip_extension(path))
    };

    if by_extension || data.starts_with(&GZIP_MAGIC) {
        let out = gunzip(&data)?;
        debug!("decompressed {} -> {} bytes", data.len(), out.len());
        Ok(out)
    } else {
        Ok(data)
    }
}
