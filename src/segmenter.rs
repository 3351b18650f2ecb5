//! Splitting oversized text into chunks the engine can handle.

/// Splits text into consecutive, order-preserving chunks.
///
/// Implementations must be deterministic and lossless: concatenating the
/// returned chunks reproduces the input exactly, and no chunk is empty.
pub trait Segmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str, max_chars: usize) -> Vec<&'a str>;
}

/// Fixed-size slicing over Unicode scalar values.
///
/// Slices never split a code point but may split words; the last slice can
/// be shorter than `max_chars`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedSizeSegmenter;

impl Segmenter for FixedSizeSegmenter {
    fn segment<'a>(&self, text: &'a str, max_chars: usize) -> Vec<&'a str> {
        let max_chars = max_chars.max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut count = 0;

        for (offset, _) in text.char_indices() {
            if count == max_chars {
                chunks.push(&text[start..offset]);
                start = offset;
                count = 0;
            }
            count += 1;
        }

        if start < text.len() {
            chunks.push(&text[start..]);
        }

        chunks
    }
}
