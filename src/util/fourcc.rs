//! FourCC helpers for RIFF chunk identifiers

/// Build a FourCC from a string, padding with spaces and truncating to four bytes.
pub fn fourcc_from_str(s: &str) -> [u8; 4] {
    let mut fourcc = *b"    ";
    for (slot, byte) in fourcc.iter_mut().zip(s.bytes()) {
        *slot = byte;
    }
    fourcc
}

/// Chunk identifier for a stream: two decimal digits followed by a two-letter type.
pub fn stream_chunk_id(stream_idx: usize, kind: &[u8; 2]) -> [u8; 4] {
    let num1 = b'0' + ((stream_idx / 10) % 10) as u8;
    let num2 = b'0' + (stream_idx % 10) as u8;
    [num1, num2, kind[0], kind[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_from_str() {
        assert_eq!(fourcc_from_str("MJPG"), *b"MJPG");
        assert_eq!(fourcc_from_str("png"), *b"png ");
        assert_eq!(fourcc_from_str("tscc2"), *b"tscc");
    }

    #[test]
    fn test_stream_chunk_id() {
        assert_eq!(stream_chunk_id(0, b"dc"), *b"00dc");
        assert_eq!(stream_chunk_id(1, b"wb"), *b"01wb");
        assert_eq!(stream_chunk_id(12, b"pc"), *b"12pc");
    }
}
