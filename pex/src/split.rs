//! Screenshot geometry.
//!
//! Two separate questions are answered here, both by scanning for whitespace:
//!
//! - where one phrase block ends and the next begins within a multi-phrase
//!   screenshot (`block_ranges`, sampling a single gutter column of the raw
//!   image), and
//! - where the target half of one block ends and the translate half begins
//!   (`find_split_row`, scanning all-white row bands of the binarized block).

use crate::config::{Layout, ParseConfig};
use crate::image::{Color, Image};

/// Maximal runs of all-white rows of a binarized image, as half-open
/// `(start, end)` row ranges in top-to-bottom order.
pub fn white_bands(bin: Image<'_>) -> Vec<(u32, u32)> {
    let mut bands = Vec::new();
    let mut open: Option<u32> = None;

    for y in 0..bin.height() {
        let white = (0..bin.width()).all(|x| bin.pixel(x, y) == Color::WHITE);
        match (white, open) {
            (true, None) => open = Some(y),
            (false, Some(start)) => {
                bands.push((start, y));
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        bands.push((start, bin.height()));
    }

    bands
}

/// Find the row separating the target text (above) from the translate text
/// (below) in a binarized block.
///
/// Requires at least `min_bands` white bands: two real text rows need outer
/// whitespace above and below plus one band between. The boundary is the
/// midpoint of the longest band among the interior bands (first and last
/// excluded; the widest gap is the true separator). Ties go to the first.
///
/// Returns `None` when the block does not look like a phrase pair; the caller
/// marks the record as errored.
pub fn find_split_row(bin: Image<'_>, min_bands: usize) -> Option<u32> {
    let bands = white_bands(bin);
    if bands.len() < min_bands {
        return None;
    }

    let interior = &bands[1..bands.len() - 1];
    let mut widest = interior[0];
    for band in &interior[1..] {
        if band.1 - band.0 > widest.1 - widest.0 {
            widest = *band;
        }
    }

    Some(widest.0 + (widest.1 - widest.0) / 2)
}

/// Vertical `(start, end)` ranges of the phrase blocks within a full
/// screenshot.
///
/// Samples the single column `cfg.gutter_column` of the raw image
/// top-to-bottom. A candidate opens at the first pixel whose channel sum
/// equals the layout's gutter-white reference and closes at the next
/// non-matching pixel (or the bottom edge). Candidates must be strictly
/// taller than `cfg.min_block_height`; shorter runs are noise between glyph
/// strokes, not blocks.
pub fn block_ranges(image: Image<'_>, layout: Layout, cfg: &ParseConfig) -> Vec<(u32, u32)> {
    if image.width() <= cfg.gutter_column {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let mut open: Option<u32> = None;

    for y in 0..image.height() {
        let matches = image.pixel(cfg.gutter_column, y).sum() == layout.gutter_white_sum;
        match (matches, open) {
            (true, None) => open = Some(y),
            (false, Some(start)) => {
                candidates.push((start, y));
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        candidates.push((start, image.height()));
    }

    candidates
        .into_iter()
        .filter(|(start, end)| end - start > cfg.min_block_height)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutVersion;
    use crate::image::OwnedImage;

    const W: u32 = 40;

    /// White image with black "text" pixels on the given row ranges.
    fn striped(height: u32, text_rows: &[(u32, u32)]) -> OwnedImage {
        let rows = text_rows.to_vec();
        OwnedImage::from_fn(W, height, move |x, y| {
            let in_text = rows.iter().any(|&(a, b)| y >= a && y < b);
            if in_text && x >= 10 && x < 30 {
                Color::BLACK
            } else {
                Color::WHITE
            }
        })
    }

    #[test]
    fn bands_cover_whitespace_runs() {
        let img = striped(40, &[(10, 15), (25, 30)]);
        let bands = white_bands(img.as_image());
        assert_eq!(bands, vec![(0, 10), (15, 25), (30, 40)]);
    }

    #[test]
    fn trailing_band_is_closed_at_bottom_edge() {
        let img = striped(40, &[(0, 5)]);
        let bands = white_bands(img.as_image());
        assert_eq!(bands, vec![(5, 40)]);
    }

    #[test]
    fn split_needs_three_bands() {
        // Zero bands: every row has text.
        let all_text = striped(20, &[(0, 20)]);
        assert_eq!(find_split_row(all_text.as_image(), 3), None);

        // One band: fully white.
        let blank = striped(20, &[]);
        assert_eq!(find_split_row(blank.as_image(), 3), None);

        // Two bands: a single text stripe.
        let single = striped(30, &[(10, 20)]);
        assert_eq!(find_split_row(single.as_image(), 3), None);
    }

    #[test]
    fn split_is_midpoint_of_widest_interior_band() {
        // Bands: (0,10), (15,35) interior, (40,60). Midpoint of (15,35) = 25.
        let img = striped(60, &[(10, 15), (35, 40)]);
        assert_eq!(find_split_row(img.as_image(), 3), Some(25));
    }

    #[test]
    fn split_ignores_outer_bands_even_when_widest() {
        // Outer bands are 30 rows each, the interior gap only 6; the interior
        // one must still win because the outer ones are excluded.
        let img = striped(80, &[(30, 40), (46, 50)]);
        assert_eq!(find_split_row(img.as_image(), 3), Some(43));
    }

    #[test]
    fn split_tie_goes_to_first_interior_band() {
        // Two interior bands of equal length (10 rows each).
        let img = striped(70, &[(10, 15), (25, 30), (40, 45)]);
        assert_eq!(find_split_row(img.as_image(), 3), Some(20));
    }

    fn classic_layout() -> Layout {
        Layout {
            version: LayoutVersion::Classic,
            gutter_white_sum: 765,
            translate_left_trim: 0,
        }
    }

    /// Screenshot whose gutter column is white on the given row ranges and
    /// gray everywhere else.
    fn column_image(height: u32, white_rows: &[(u32, u32)]) -> OwnedImage {
        let rows = white_rows.to_vec();
        OwnedImage::from_fn(20, height, move |_, y| {
            if rows.iter().any(|&(a, b)| y >= a && y < b) {
                Color::WHITE
            } else {
                Color::new(200, 200, 200)
            }
        })
    }

    #[test]
    fn block_ranges_keep_only_tall_runs() {
        // Matching runs of 5, 200, 5, 150, 5 rows with gaps between; with
        // min height 140 only the 200- and 150-run survive.
        let img = column_image(
            400,
            &[(0, 5), (10, 210), (215, 220), (225, 375), (380, 385)],
        );
        let cfg = ParseConfig::default();

        let ranges = block_ranges(img.as_image(), classic_layout(), &cfg);
        assert_eq!(ranges, vec![(10, 210), (225, 375)]);
    }

    #[test]
    fn block_ranges_min_height_is_strict() {
        let cfg = ParseConfig::default();

        let exact = column_image(200, &[(10, 150)]);
        assert!(block_ranges(exact.as_image(), classic_layout(), &cfg).is_empty());

        let above = column_image(200, &[(10, 151)]);
        assert_eq!(
            block_ranges(above.as_image(), classic_layout(), &cfg),
            vec![(10, 151)]
        );
    }

    #[test]
    fn block_ranges_close_open_run_at_bottom() {
        let img = column_image(300, &[(100, 300)]);
        let cfg = ParseConfig::default();

        let ranges = block_ranges(img.as_image(), classic_layout(), &cfg);
        assert_eq!(ranges, vec![(100, 300)]);
    }

    #[test]
    fn block_ranges_match_layout_reference_sum() {
        // Redesign gutter tint: detected only under the redesign layout.
        let img = OwnedImage::from_fn(20, 300, |_, y| {
            if (50..250).contains(&y) {
                Color::new(243, 247, 250)
            } else {
                Color::new(200, 200, 200)
            }
        });
        let cfg = ParseConfig::default();

        let redesign = Layout {
            version: LayoutVersion::Redesign,
            gutter_white_sum: cfg.redesign_gutter_sum,
            translate_left_trim: cfg.redesign_arrow_trim,
        };

        assert!(block_ranges(img.as_image(), classic_layout(), &cfg).is_empty());
        assert_eq!(
            block_ranges(img.as_image(), redesign, &cfg),
            vec![(50, 250)]
        );
    }

    #[test]
    fn block_ranges_on_narrow_image() {
        let img = OwnedImage::from_fn(4, 300, |_, _| Color::WHITE);
        let cfg = ParseConfig::default();
        assert!(block_ranges(img.as_image(), classic_layout(), &cfg).is_empty());
    }
}
