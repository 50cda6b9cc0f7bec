//! Log file loading with legacy-encoding fallback.

use std::fs;
use std::path::Path;

use crate::error::LoadResult;

use super::observability::Recovery;
use super::unified::Loaded;

/// Load a log file as a list of lines (terminators stripped).
///
/// The file is read as UTF-8 first. On any read or decoding failure it is re-read as raw bytes
/// and decoded with [`decode_legacy`]; the result then carries [`Recovery::LegacyEncoding`].
/// Only an I/O failure on the second read is returned as an error.
pub fn load_log_from_path(path: impl AsRef<Path>) -> LoadResult<Loaded<Vec<String>>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => Ok(Loaded::clean(split_lines(&text))),
        Err(_) => {
            let bytes = fs::read(path)?;
            Ok(Loaded::recovered(decode_legacy(&bytes), Recovery::LegacyEncoding))
        }
    }
}

/// Decode bytes with the single-byte windows-1252 encoding and split into lines.
///
/// Every byte maps to a character, so this never fails.
pub fn decode_legacy(bytes: &[u8]) -> Vec<String> {
    let (text, _had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    split_lines(&text)
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::decode_legacy;

    #[test]
    fn legacy_decoding_maps_high_bytes() {
        let lines = decode_legacy(b"caf\xe9\r\nna\xefve\n");
        assert_eq!(lines, vec!["café".to_string(), "naïve".to_string()]);
    }
}
