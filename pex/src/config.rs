//! Parsing constants.
//!
//! Every threshold, offset, and reference color the pipeline uses lives in
//! one immutable structure passed into the components at construction, so
//! tests can substitute synthetic values and the app config can override the
//! production ones.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::highlight::ColorRange;

/// Visual generation of the source screenshots.
///
/// The upstream app changed its background rendering at a fixed point in
/// time: screenshots captured strictly before [`ParseConfig::layout_cutoff`]
/// carry a pure-white inter-block gutter, later ones a slightly tinted one
/// plus a directional-arrow glyph at the left edge of the translate half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutVersion {
    Classic,
    Redesign,
}

/// Layout-dependent constants resolved for one message date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub version: LayoutVersion,
    /// Channel sum a gutter-column pixel must equal to count as whitespace.
    pub gutter_white_sum: u32,
    /// Extra left margin cropped off the translate half (arrow glyph width).
    pub translate_left_trim: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Luminance above this value binarizes to white.
    pub black_threshold: u8,
    /// Minimum count of all-white row bands required for a target/translate
    /// split (outer whitespace above and below plus one between).
    pub min_separator_bands: usize,
    /// X offset of the single sampled column used for block extraction. The
    /// column intersects only inter-block gutters, never glyphs.
    pub gutter_column: u32,
    /// Gutter runs must be strictly taller than this to become a block.
    pub min_block_height: u32,
    /// The tag strip is sampled this many rows above a word box.
    pub tag_offset: u32,
    /// Minimum strip coverage (percent) for a word to count as tagged.
    pub tag_threshold: u32,
    /// Highlight color of tagged words in the source app.
    pub highlight: ColorRange,
    /// Message dates strictly before this use the classic layout.
    pub layout_cutoff: NaiveDateTime,
    /// Gutter reference sum before the cutoff (pure white, 255 * 3).
    pub classic_gutter_sum: u32,
    /// Gutter reference sum from the cutoff on (243 + 247 + 250).
    pub redesign_gutter_sum: u32,
    /// Width of the arrow glyph trimmed off the translate half in the
    /// redesigned layout.
    pub redesign_arrow_trim: u32,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            black_threshold: 150,
            min_separator_bands: 3,
            gutter_column: 7,
            min_block_height: 140,
            tag_offset: 4,
            tag_threshold: 15,
            highlight: ColorRange::TAG,
            layout_cutoff: default_cutoff(),
            classic_gutter_sum: 765,
            redesign_gutter_sum: 740,
            redesign_arrow_trim: 32,
        }
    }
}

impl ParseConfig {
    pub fn version_for(&self, date: NaiveDateTime) -> LayoutVersion {
        if date < self.layout_cutoff {
            LayoutVersion::Classic
        } else {
            LayoutVersion::Redesign
        }
    }

    /// Resolve the layout-dependent constants for one message date.
    pub fn layout_for(&self, date: NaiveDateTime) -> Layout {
        match self.version_for(date) {
            LayoutVersion::Classic => Layout {
                version: LayoutVersion::Classic,
                gutter_white_sum: self.classic_gutter_sum,
                translate_left_trim: 0,
            },
            LayoutVersion::Redesign => Layout {
                version: LayoutVersion::Redesign,
                gutter_white_sum: self.redesign_gutter_sum,
                translate_left_trim: self.redesign_arrow_trim,
            },
        }
    }
}

fn default_cutoff() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 3, 28)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("static cutoff date")
}
