//! Header layout shared by the writer and the reader.

use digdar_pool::SweepMeta;

/// Magic string opening every sweep file.
pub const MAGIC: &str = "DigDar radar sweep file\n";

/// Alignment of the binary payload within the file.
pub const PAYLOAD_ALIGN: usize = 8;

/// Padding bytes needed after a header of `header_len` bytes so the payload
/// starts [`PAYLOAD_ALIGN`]-aligned. Derivable from the header length alone,
/// so the reader needs no explicit padding field.
#[must_use]
pub fn padding_for(header_len: usize) -> usize {
    (PAYLOAD_ALIGN - header_len % PAYLOAD_ALIGN) % PAYLOAD_ALIGN
}

/// Encode the textual header: magic line, JSON metadata record, newline, and
/// blank padding up to the payload alignment.
pub fn encode_header(meta: &SweepMeta) -> serde_json::Result<Vec<u8>> {
    let json = serde_json::to_string(meta)?;
    let mut header = Vec::with_capacity(MAGIC.len() + json.len() + 1 + PAYLOAD_ALIGN);
    header.extend_from_slice(MAGIC.as_bytes());
    header.extend_from_slice(json.as_bytes());
    header.push(b'\n');
    let pad = padding_for(header.len());
    header.resize(header.len() + pad, b' ');
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(8), 0);
        assert_eq!(padding_for(9), 7);
        assert_eq!(padding_for(15), 1);
        assert_eq!(padding_for(16), 0);
    }
}
