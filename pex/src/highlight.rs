//! Tagged-word detection.
//!
//! The source app underlines words of interest with a pale-yellow highlight.
//! The highlight never overlaps the glyphs themselves, so detection samples a
//! one-pixel strip directly above each OCR word box in the raw (non-binarized)
//! half image and measures how much of it falls into the highlight color
//! range.

use serde::{Deserialize, Serialize};

use crate::config::ParseConfig;
use crate::image::{Color, Image};
use crate::ocr::WordBox;

/// Half-open per-channel RGB range, `lo <= v < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub r: (u8, u8),
    pub g: (u8, u8),
    pub b: (u8, u8),
}

impl ColorRange {
    /// Highlight color of tagged words.
    pub const TAG: Self = Self {
        r: (245, 255),
        g: (245, 255),
        b: (212, 228),
    };

    pub fn contains(&self, c: Color) -> bool {
        (self.r.0..self.r.1).contains(&c.r)
            && (self.g.0..self.g.1).contains(&c.g)
            && (self.b.0..self.b.1).contains(&c.b)
    }
}

/// Result of scanning one half image's word boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScan {
    /// Lowercased tagged words (trailing `,`/`.` trimmed) joined by spaces.
    pub tag: String,
    /// One `'1'`/`'0'` per word box, in OCR order.
    pub mask: String,
    /// Raw strip coverage (percent) per word box, for diagnostics.
    pub coverage: Vec<u32>,
}

/// Percentage of highlight-colored pixels in the strip above one word box,
/// truncated to an integer.
///
/// A box hugging the top edge samples row 0; a degenerate box counts as 0%.
fn strip_coverage(raw: Image<'_>, word: &WordBox, cfg: &ParseConfig) -> u32 {
    let ((x1, y1), (x2, _)) = word.position;
    let y = y1.saturating_sub(cfg.tag_offset);

    let x1 = x1.min(raw.width());
    let x2 = x2.min(raw.width());
    if x2 <= x1 || y >= raw.height() {
        return 0;
    }

    let mut hits = 0u32;
    for x in x1..x2 {
        if cfg.highlight.contains(raw.pixel(x, y)) {
            hits += 1;
        }
    }

    100 * hits / (x2 - x1)
}

/// Classify each word box against the raw half image it was recognized in.
///
/// Untagged words still occupy a position in the mask even though their text
/// is excluded from the tag string.
pub fn scan_tags(raw: Image<'_>, boxes: &[WordBox], cfg: &ParseConfig) -> TagScan {
    let mut words = Vec::new();
    let mut mask = String::with_capacity(boxes.len());
    let mut coverage = Vec::with_capacity(boxes.len());

    for word in boxes {
        let value = strip_coverage(raw, word, cfg);
        if value >= cfg.tag_threshold {
            mask.push('1');
            words.push(word.content.trim_end_matches([',', '.']).to_lowercase());
        } else {
            mask.push('0');
        }
        coverage.push(value);
    }

    let tag = words.join(" ").replace('\n', " ");

    TagScan {
        tag,
        mask,
        coverage,
    }
}
