//! Overlapping fixed-size text windows.
//!
//! Windows are `chunk_size` characters with `chunk_overlap` characters
//! shared between consecutive windows. A window that would end mid-text
//! prefers to end on a sentence boundary near the window edge, falling back
//! to whitespace, falling back to a hard cut. The overlap is taken from the
//! adjusted end, so consecutive chunks always share exactly the configured
//! number of characters.

/// Fraction of the window searched backwards for a break point.
const BOUNDARY_SEARCH_DIVISOR: usize = 5;

pub fn split_into_chunks(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Vec::new();
    }

    let size = chunk_size.max(1);
    let overlap = chunk_overlap.min(size.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + size).min(total);
        let end = if hard_end < total {
            let snapped = snap_to_boundary(&chars, start, hard_end);
            // A snap that retreats into the overlap region would stall the
            // walk, so fall back to the hard cut.
            if snapped > start + overlap {
                snapped
            } else {
                hard_end
            }
        } else {
            hard_end
        };

        chunks.push(chars[start..end].iter().collect());

        if end >= total {
            break;
        }
        start = end - overlap;
    }

    chunks
}

fn snap_to_boundary(chars: &[char], start: usize, hard_end: usize) -> usize {
    let window = hard_end - start;
    let floor = hard_end - (window / BOUNDARY_SEARCH_DIVISOR).max(1);

    let mut i = hard_end;
    while i > floor {
        if matches!(chars[i - 1], '.' | '!' | '?') && chars[i].is_whitespace() {
            return i;
        }
        i -= 1;
    }

    let mut i = hard_end;
    while i > floor {
        if chars[i - 1].is_whitespace() {
            return i;
        }
        i -= 1;
    }

    hard_end
}
