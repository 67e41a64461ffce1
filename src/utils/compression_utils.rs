use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

pub(crate) const ENCODING_GZIP: &str = "gzip";
pub(crate) const ENCODING_DEFLATE: &str = "deflate";

pub(crate) const fn is_gzip(bytes: &[u8]) -> bool {
    // Gzip files start with the bytes 0x1F 0x8B
    bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B
}

pub(crate) const fn is_deflate(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x78 && (bytes[1] == 0x01 || bytes[1] == 0x9C || bytes[1] == 0xDA)
}

pub(crate) fn decompress_gzip(input: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(input);
    let mut decompressed = String::new();
    decoder.read_to_string(&mut decompressed)?;
    Ok(decompressed)
}

pub(crate) fn decompress_deflate(input: &[u8]) -> std::io::Result<String> {
    let mut decoder = ZlibDecoder::new(input);
    let mut decompressed = String::new();
    decoder.read_to_string(&mut decompressed)?;
    Ok(decompressed)
}
