//! Fixed-width text chunking for ingestion.
//!
//! A chunk is a maximal run of at most `max_chars` characters containing no
//! line terminator. Line breaks end the current chunk and are dropped; blank
//! lines produce nothing.

/// Characters that terminate a chunk.
fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Returns an empty vector when `max_chars` is zero.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    for line in text.split(is_line_terminator) {
        let mut current = String::new();
        let mut count = 0;
        for c in line.chars() {
            current.push(c);
            count += 1;
            if count == max_chars {
                chunks.push(std::mem::take(&mut current));
                count = 0;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("Net terms are 30 days.", 500), vec!["Net terms are 30 days."]);
    }

    #[test]
    fn long_line_is_split_at_width() {
        let text = "a".repeat(1200);
        let chunks = chunk_text(&text, 500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn newlines_end_chunks_and_are_dropped() {
        let chunks = chunk_text("first line\nsecond line\r\n\nthird", 500);
        assert_eq!(chunks, vec!["first line", "second line", "third"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("\n\n\r\n", 500).is_empty());
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let chunks = chunk_text("äöüäöü", 4);
        assert_eq!(chunks, vec!["äöüä", "öü"]);
    }

    #[test]
    fn zero_width_yields_nothing() {
        assert!(chunk_text("anything", 0).is_empty());
    }
}
