use encoding_rs::{
    Encoding,
    MACINTOSH,
    UTF_16BE,
    UTF_16LE,
    UTF_8,
    WINDOWS_1252,
};

use crate::core::ShengciError;

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Decode export bytes with a fallback chain: BOM, strict UTF-8, UTF-16
/// (exports that lost their BOM show up as alternating NUL bytes), Latin-1
/// (windows-1252), and finally legacy Mac Roman.
pub fn decode_table_bytes(bytes: &[u8], file: &str) -> Result<String, ShengciError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        if let Some(text) = decode_strict(encoding, bytes) {
            return Ok(text);
        }
    }

    // NUL bytes are valid UTF-8, so bomless UTF-16 must be ruled out first
    let nul_count = bytes.iter().filter(|b| **b == 0).count();
    if nul_count * 4 >= bytes.len() && !bytes.is_empty() {
        let even_nuls = bytes.iter().step_by(2).filter(|b| **b == 0).count();
        let odd_nuls = nul_count - even_nuls;
        let ordered = if even_nuls > odd_nuls { [UTF_16BE, UTF_16LE] } else { [UTF_16LE, UTF_16BE] };
        for encoding in ordered {
            if let Some(text) = decode_strict(encoding, bytes) {
                return Ok(text);
            }
        }
    }

    if let Some(text) = decode_strict(UTF_8, bytes) {
        return Ok(text);
    }

    if let Some(text) = decode_strict(WINDOWS_1252, bytes) {
        return Ok(text);
    }

    if let Some(text) = decode_strict(MACINTOSH, bytes) {
        return Ok(text);
    }

    Err(ShengciError::UndecodableFile(file.to_string()))
}
