/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same value.
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

/// Decodes one CSV field; an empty field is a missing cell.
pub fn cell_from_bytes(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(decode_latin1(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1_accents() {
        // "Notificação" in ISO-8859-1
        let raw = b"Notifica\xe7\xe3o";
        assert_eq!(decode_latin1(raw), "Notificação");
    }

    #[test]
    fn test_cell_from_bytes_empty_is_missing() {
        assert_eq!(cell_from_bytes(b""), None);
        assert_eq!(cell_from_bytes(b" "), Some(" ".to_string()));
    }
}
