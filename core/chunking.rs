use crate::error::{AppError, Result};

/// Lazy, restartable split of a string into pieces of at most `max_chars`
/// characters. Cloning the iterator restarts from the clone's position.
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    remaining: &'a str,
    max_chars: usize,
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        // Byte offset of the first char past the limit, or the whole tail.
        let split_at = self
            .remaining
            .char_indices()
            .nth(self.max_chars)
            .map_or(self.remaining.len(), |(idx, _)| idx);
        let (chunk, rest) = self.remaining.split_at(split_at);
        self.remaining = rest;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining.is_empty() {
            return (0, Some(0));
        }
        // Between one char and four bytes per char.
        let bytes = self.remaining.len();
        (
            bytes.div_ceil(4).div_ceil(self.max_chars),
            Some(bytes.div_ceil(self.max_chars)),
        )
    }
}

impl std::iter::FusedIterator for TextChunks<'_> {}

/// Splits `text` into consecutive chunks of `max_chars` characters, the last
/// one holding the remainder. Empty text yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Result<TextChunks<'_>> {
    if max_chars == 0 {
        return Err(AppError::Chunking(
            "Chunk size must be greater than 0 characters".to_string(),
        ));
    }
    Ok(TextChunks {
        remaining: text,
        max_chars,
    })
}

/// Number of chunks [`chunk_text`] yields without walking them.
pub fn chunk_count(text: &str, max_chars: usize) -> Result<usize> {
    if max_chars == 0 {
        return Err(AppError::Chunking(
            "Chunk size must be greater than 0 characters".to_string(),
        ));
    }
    Ok(text.chars().count().div_ceil(max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_chunks() {
        assert_eq!(chunk_text("", 10).unwrap().count(), 0);
        assert_eq!(chunk_count("", 10).unwrap(), 0);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(chunk_text("abc", 0), Err(AppError::Chunking(_))));
        assert!(matches!(chunk_count("abc", 0), Err(AppError::Chunking(_))));
    }

    #[test]
    fn concatenation_reproduces_input() {
        let samples = [
            "a",
            "hello world",
            "line one\nline two\r\nline three\n",
            "ünïcødé ✓ 漢字 🎉 mixed with ascii",
            "exactly-ten",
        ];
        for text in samples {
            for size in 1..=13 {
                let chunks: Vec<&str> = chunk_text(text, size).unwrap().collect();
                assert_eq!(chunks.concat(), text, "size {size}");
                let expected = text.chars().count().div_ceil(size);
                assert_eq!(chunks.len(), expected, "size {size}");
                assert_eq!(chunk_count(text, size).unwrap(), expected);
            }
        }
    }

    #[test]
    fn only_last_chunk_may_be_short() {
        let text = "abcdefghij-klmnopqrst-uvw";
        let chunks: Vec<&str> = chunk_text(text, 7).unwrap().collect();
        let (last, full) = chunks.split_last().unwrap();
        assert!(full.iter().all(|c| c.chars().count() == 7));
        assert!((1..=7).contains(&last.chars().count()));
    }

    #[test]
    fn exact_multiple_gives_full_last_chunk() {
        let text = "x".repeat(2 * 50);
        let chunks: Vec<&str> = chunk_text(&text, 50).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chars().count(), 50);
    }

    #[test]
    fn multibyte_chars_are_never_split() {
        let text = "🎉🎉🎉";
        let chunks: Vec<&str> = chunk_text(text, 2).unwrap().collect();
        assert_eq!(chunks, vec!["🎉🎉", "🎉"]);
    }

    #[test]
    fn cloned_iterator_restarts_independently() {
        let chunks = chunk_text("abcdef", 4).unwrap();
        let first: Vec<&str> = chunks.clone().collect();
        let second: Vec<&str> = chunks.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["abcd", "ef"]);
    }
}
