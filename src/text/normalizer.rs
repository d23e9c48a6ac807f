use super::types::NormalizedSpan;

/// Unicode blocks treated as emoji and always discarded.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // misc symbols and pictographs
    (0x1F680, 0x1F6FF), // transport and map symbols
    (0x1F700, 0x1F77F), // alchemical symbols
    (0x1F780, 0x1F7FF), // geometric shapes extended
    (0x1F800, 0x1F8FF), // supplemental arrows
    (0x1F900, 0x1F9FF), // supplemental symbols and pictographs
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
    (0xFE00, 0xFE0F),   // variation selectors
    (0x1FA70, 0x1FAFF), // symbols and pictographs extended-a
];

pub fn is_emoji(c: char) -> bool {
    let code = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| code >= start && code <= end)
}

pub fn is_english_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Projects `raw` onto its lower-case, letters-only form.
///
/// Code points are visited in order. Emoji and anything that is not an ASCII letter
/// is skipped. The byte offsets of the first and last kept letter bound the
/// `original` slice, so punctuation and casing inside the phrase survive for display
/// while leading and trailing noise does not.
///
/// Total and pure: an input with no letters yields [`NormalizedSpan::empty`].
pub fn normalize(raw: &str) -> NormalizedSpan {
    let mut cleaned = String::with_capacity(raw.len());
    let mut bounds: Option<(usize, usize)> = None;

    for (offset, c) in raw.char_indices() {
        if is_emoji(c) || !is_english_letter(c) {
            continue;
        }

        cleaned.push(c.to_ascii_lowercase());

        // Letters are single-byte, so the exclusive end is offset + 1
        let end = offset + c.len_utf8();
        bounds = match bounds {
            None => Some((offset, end)),
            Some((start, _)) => Some((start, end)),
        };
    }

    match bounds {
        Some((start_offset, end_offset)) => NormalizedSpan {
            original: raw[start_offset..end_offset].to_string(),
            cleaned,
            start_offset,
            end_offset,
        },
        None => NormalizedSpan::empty(),
    }
}
