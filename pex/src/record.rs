//! Phrase records.
//!
//! One `PhraseRecord` owns one phrase-pair block cut out of a screenshot:
//! the raw crop, its target/translate halves (split at construction), their
//! binarized counterparts, and the text/tag/mask strings extracted by
//! `perform`. Records are independent of each other; once terminal they are
//! read-only as far as callers are concerned.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::{Layout, ParseConfig};
use crate::highlight;
use crate::image::OwnedImage;
use crate::ocr::Recognizer;
use crate::split;

/// Date format used for message timestamps end to end.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Todo,
    Error,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Todo => write!(f, "todo"),
            State::Error => write!(f, "error"),
            State::Done => write!(f, "done"),
        }
    }
}

/// Message-level metadata attached to every record of one screenshot.
#[derive(Debug, Clone, Serialize)]
pub struct RecordMeta {
    /// Ingestion batch this record belongs to; `None` for ad hoc parsing.
    pub meta_id: Option<i64>,
    pub message_id: i64,
    pub message_date: NaiveDateTime,
}

/// One phrase pair cut out of a screenshot.
#[derive(Debug, Clone)]
pub struct PhraseRecord {
    meta: RecordMeta,
    /// 1-based position of this block within the source screenshot.
    file_index: u32,
    /// Vertical source range `(y_start, y_end)` of the block.
    coordinates: (u32, u32),
    size: (u32, u32),
    /// Non-zero strip coverage percentages, one inner vec per scanned half.
    threshold: Vec<Vec<u32>>,

    image: OwnedImage,
    target_image: OwnedImage,
    translate_image: OwnedImage,
    target_bin: OwnedImage,
    translate_bin: OwnedImage,

    state: State,
    target_string: String,
    target_tag: String,
    target_mask: String,
    translate_string: String,
    translate_tag: String,
    translate_mask: String,
}

impl PhraseRecord {
    /// Build a record from one block crop, splitting it into its halves.
    ///
    /// When no separator row is found the record enters `Error` immediately
    /// and both halves alias the unsplit block, so the offending image stays
    /// inspectable.
    pub(crate) fn new(
        block: OwnedImage,
        meta: RecordMeta,
        file_index: u32,
        coordinates: (u32, u32),
        layout: Layout,
        cfg: &ParseConfig,
    ) -> Self {
        let size = (block.width(), block.height());
        let bin = block.binarized(cfg.black_threshold);

        let (state, target_image, translate_image) =
            match split::find_split_row(bin.as_image(), cfg.min_separator_bands) {
                Some(row) => {
                    let view = block.as_image();
                    let target = view.sub_image(0, 0, view.width(), row).to_owned_image();

                    // The redesigned layout paints an arrow glyph at the left
                    // edge of the translate half; trim it off.
                    let trim = layout.translate_left_trim.min(view.width());
                    let translate = view
                        .sub_image(trim, row, view.width() - trim, view.height() - row)
                        .to_owned_image();

                    (State::Todo, target, translate)
                }
                None => {
                    tracing::warn!(
                        message_id = meta.message_id,
                        file_index,
                        "no separator row found, record marked as error"
                    );
                    (State::Error, block.clone(), block.clone())
                }
            };

        let target_bin = target_image.binarized(cfg.black_threshold);
        let translate_bin = translate_image.binarized(cfg.black_threshold);

        Self {
            meta,
            file_index,
            coordinates,
            size,
            threshold: Vec::new(),
            image: block,
            target_image,
            translate_image,
            target_bin,
            translate_bin,
            state,
            target_string: String::new(),
            target_tag: String::new(),
            target_mask: String::new(),
            translate_string: String::new(),
            translate_tag: String::new(),
            translate_mask: String::new(),
        }
    }

    /// Run the four extraction steps and finish the record.
    ///
    /// `Error` records are a no-op returning `false`. `Done` records are an
    /// explicit no-op returning `true` (re-running the extractions would only
    /// recompute the same values). Otherwise: target text, target tag+mask,
    /// translate text, translate tag+mask, in that order; none of the steps
    /// can fail the record (empty OCR output is valid), then the state
    /// becomes `Done`.
    pub fn perform<R: Recognizer>(&mut self, ocr: &R, cfg: &ParseConfig) -> bool {
        match self.state {
            State::Error => false,
            State::Done => true,
            State::Todo => {
                self.target_string = collapse(ocr.text(self.target_bin.as_image()));
                let boxes = ocr.word_boxes(self.target_bin.as_image());
                let scan = highlight::scan_tags(self.target_image.as_image(), &boxes, cfg);
                self.target_tag = scan.tag;
                self.target_mask = scan.mask;
                self.threshold
                    .push(scan.coverage.into_iter().filter(|v| *v != 0).collect());

                self.translate_string = collapse(ocr.text(self.translate_bin.as_image()));
                let boxes = ocr.word_boxes(self.translate_bin.as_image());
                let scan = highlight::scan_tags(self.translate_image.as_image(), &boxes, cfg);
                self.translate_tag = scan.tag;
                self.translate_mask = scan.mask;
                self.threshold
                    .push(scan.coverage.into_iter().filter(|v| *v != 0).collect());

                self.state = State::Done;
                true
            }
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether extraction produced a usable pair.
    ///
    /// `translate_tag` emptiness deliberately does not participate: target
    /// screenshots always tag at least one word, translate halves often tag
    /// none.
    pub fn success(&self) -> bool {
        self.state == State::Done
            && !self.target_string.is_empty()
            && !self.target_tag.is_empty()
            && !self.translate_string.is_empty()
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    pub fn coordinates(&self) -> (u32, u32) {
        self.coordinates
    }

    pub fn image(&self) -> &OwnedImage {
        &self.image
    }

    pub fn target_image(&self) -> &OwnedImage {
        &self.target_image
    }

    pub fn translate_image(&self) -> &OwnedImage {
        &self.translate_image
    }

    pub fn target_bin(&self) -> &OwnedImage {
        &self.target_bin
    }

    pub fn translate_bin(&self) -> &OwnedImage {
        &self.translate_bin
    }

    pub fn target_string(&self) -> &str {
        &self.target_string
    }

    pub fn target_tag(&self) -> &str {
        &self.target_tag
    }

    pub fn target_mask(&self) -> &str {
        &self.target_mask
    }

    pub fn translate_string(&self) -> &str {
        &self.translate_string
    }

    pub fn translate_tag(&self) -> &str {
        &self.translate_tag
    }

    pub fn translate_mask(&self) -> &str {
        &self.translate_mask
    }

    /// Bookkeeping blob stored alongside the phrase columns.
    fn metainfo(&self) -> String {
        serde_json::json!({
            "file_index": self.file_index,
            "coordinates": [self.coordinates.0, self.coordinates.1],
            "size": [self.size.0, self.size.1],
            "threshold": self.threshold,
        })
        .to_string()
    }

    /// Flat field tuple in persistence column order.
    pub fn row(&self) -> PhraseRow {
        PhraseRow {
            meta_id: self.meta.meta_id,
            state: self.state.to_string(),
            success: self.success(),
            target: self.target_string.clone(),
            target_tag: self.target_tag.clone(),
            translate: self.translate_string.clone(),
            translate_tag: self.translate_tag.clone(),
            target_mask: self.target_mask.clone(),
            translate_mask: self.translate_mask.clone(),
            message_id: self.meta.message_id,
            message_date: self.meta.message_date.format(DATETIME_FORMAT).to_string(),
            metadata: self.metainfo(),
        }
    }

    /// Human-facing parse result.
    pub fn summary(&self) -> Summary {
        Summary {
            state: self.state,
            success: self.success(),
            target_string: self.target_string.clone(),
            target_tag: self.target_tag.clone(),
            target_mask: self.target_mask.clone(),
            translate_string: self.translate_string.clone(),
            translate_tag: self.translate_tag.clone(),
            translate_mask: self.translate_mask.clone(),
            metadata: self.metainfo(),
        }
    }
}

/// The flat persistence tuple of one record.
///
/// Field order is load-bearing: the store binds these positionally to a
/// prepared statement. Do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseRow {
    pub meta_id: Option<i64>,
    pub state: String,
    pub success: bool,
    pub target: String,
    pub target_tag: String,
    pub translate: String,
    pub translate_tag: String,
    pub target_mask: String,
    pub translate_mask: String,
    pub message_id: i64,
    pub message_date: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub state: State,
    pub success: bool,
    pub target_string: String,
    pub target_tag: String,
    pub target_mask: String,
    pub translate_string: String,
    pub translate_tag: String,
    pub translate_mask: String,
    pub metadata: String,
}

fn collapse(text: String) -> String {
    text.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::image::{Color, Image};
    use crate::ocr::WordBox;

    const HIGHLIGHT: Color = Color::new(250, 250, 220);

    struct FakeOcr {
        text: String,
        boxes: Vec<WordBox>,
        calls: Cell<u32>,
    }

    impl FakeOcr {
        fn new(text: &str, boxes: Vec<WordBox>) -> Self {
            Self {
                text: text.to_string(),
                boxes,
                calls: Cell::new(0),
            }
        }
    }

    impl Recognizer for FakeOcr {
        fn text(&self, _image: Image<'_>) -> String {
            self.calls.set(self.calls.get() + 1);
            self.text.clone()
        }

        fn word_boxes(&self, _image: Image<'_>) -> Vec<WordBox> {
            self.calls.set(self.calls.get() + 1);
            self.boxes.clone()
        }
    }

    fn word(content: &str, x1: u32, y1: u32, x2: u32, y2: u32) -> WordBox {
        WordBox {
            content: content.to_string(),
            position: ((x1, y1), (x2, y2)),
        }
    }

    /// One 46x145 phrase block: target text on rows 34..50 with a highlight
    /// strip right above it, translate text on rows 80..100, whitespace
    /// everywhere else. The separator band (rows 50..80) splits at row 65.
    fn block() -> OwnedImage {
        OwnedImage::from_fn(46, 145, |x, y| {
            let in_text_cols = (13..33).contains(&x);
            if in_text_cols && (30..34).contains(&y) {
                HIGHLIGHT
            } else if in_text_cols && ((34..50).contains(&y) || (80..100).contains(&y)) {
                Color::BLACK
            } else {
                Color::WHITE
            }
        })
    }

    fn meta() -> RecordMeta {
        RecordMeta {
            meta_id: Some(7),
            message_id: 232,
            message_date: NaiveDateTime::parse_from_str("2022-10-23T13:10:11", DATETIME_FORMAT)
                .unwrap(),
        }
    }

    fn record_with(ocr_boxes: Vec<WordBox>) -> (PhraseRecord, FakeOcr) {
        let cfg = ParseConfig::default();
        let meta = meta();
        let layout = cfg.layout_for(meta.message_date);
        let record = PhraseRecord::new(block(), meta, 1, (10, 155), layout, &cfg);
        (record, FakeOcr::new("kot", ocr_boxes))
    }

    #[test]
    fn split_block_extracts_both_halves() {
        let cfg = ParseConfig::default();
        let (mut record, ocr) = record_with(vec![word("kot", 13, 34, 33, 46)]);

        assert_eq!(record.state(), State::Todo);
        assert_eq!(record.target_image().height(), 65);
        assert_eq!(record.translate_image().height(), 80);
        assert_eq!(record.target_image().width(), 46);

        assert!(record.perform(&ocr, &cfg));
        assert_eq!(record.state(), State::Done);

        // The strip above the target box lands on the highlight rows; the
        // same coordinates in the translate half land on whitespace.
        assert_eq!(record.target_string(), "kot");
        assert_eq!(record.target_tag(), "kot");
        assert_eq!(record.target_mask(), "1");
        assert_eq!(record.translate_string(), "kot");
        assert_eq!(record.translate_tag(), "");
        assert_eq!(record.translate_mask(), "0");
        assert!(record.success());
    }

    #[test]
    fn empty_ocr_output_is_done_but_unsuccessful() {
        let cfg = ParseConfig::default();
        let (mut record, _) = record_with(vec![]);
        let ocr = FakeOcr::new("", vec![]);

        assert!(record.perform(&ocr, &cfg));
        assert_eq!(record.state(), State::Done);
        assert!(!record.success());
        assert_eq!(record.target_mask(), "");
        assert_eq!(record.translate_mask(), "");
    }

    #[test]
    fn failed_split_keeps_unsplit_halves() {
        let cfg = ParseConfig::default();
        let meta = meta();
        let layout = cfg.layout_for(meta.message_date);

        // A solid block binarizes to zero white bands.
        let solid = OwnedImage::from_fn(40, 150, |_, _| Color::BLACK);
        let mut record = PhraseRecord::new(solid.clone(), meta, 1, (0, 150), layout, &cfg);

        assert_eq!(record.state(), State::Error);
        assert_eq!(record.target_image(), &solid);
        assert_eq!(record.translate_image(), &solid);

        let ocr = FakeOcr::new("kot", vec![]);
        assert!(!record.perform(&ocr, &cfg));
        assert_eq!(record.state(), State::Error);
        assert_eq!(ocr.calls.get(), 0);
        assert!(!record.success());
    }

    #[test]
    fn perform_on_done_record_is_a_noop() {
        let cfg = ParseConfig::default();
        let (mut record, ocr) = record_with(vec![word("kot", 13, 34, 33, 46)]);

        assert!(record.perform(&ocr, &cfg));
        let after_first = ocr.calls.get();
        assert_eq!(after_first, 4);

        assert!(record.perform(&ocr, &cfg));
        assert_eq!(ocr.calls.get(), after_first);
    }

    #[test]
    fn redesign_layout_trims_arrow_off_translate_half() {
        let cfg = ParseConfig::default();
        let date =
            NaiveDateTime::parse_from_str("2023-04-13T09:00:00", DATETIME_FORMAT).unwrap();
        let meta = RecordMeta {
            meta_id: None,
            message_id: 1,
            message_date: date,
        };
        let layout = cfg.layout_for(date);

        let record = PhraseRecord::new(block(), meta, 1, (0, 145), layout, &cfg);

        assert_eq!(record.target_image().width(), 46);
        assert_eq!(
            record.translate_image().width(),
            46 - cfg.redesign_arrow_trim
        );
    }

    #[test]
    fn row_of_errored_record() {
        let cfg = ParseConfig::default();
        let meta = meta();
        let layout = cfg.layout_for(meta.message_date);

        let solid = OwnedImage::from_fn(40, 150, |_, _| Color::BLACK);
        let record = PhraseRecord::new(solid, meta, 2, (160, 310), layout, &cfg);

        let row = record.row();
        assert_eq!(row.meta_id, Some(7));
        assert_eq!(row.state, "error");
        assert!(!row.success);
        assert_eq!(row.target, "");
        assert_eq!(row.target_tag, "");
        assert_eq!(row.translate, "");
        assert_eq!(row.message_id, 232);
        assert_eq!(row.message_date, "2022-10-23T13:10:11");
        assert!(row.metadata.contains("\"file_index\":2"));
        assert!(row.metadata.contains("\"coordinates\":[160,310]"));
    }

    #[test]
    fn threshold_diagnostics_keep_non_zero_values_only() {
        let cfg = ParseConfig::default();
        let (mut record, ocr) = record_with(vec![
            word("kot", 13, 34, 33, 46),
            word("pies", 34, 34, 44, 46),
        ]);

        assert!(record.perform(&ocr, &cfg));

        // Two halves scanned; the target half has one fully covered box, the
        // second box sits over whitespace and its 0% reading is dropped.
        assert_eq!(record.threshold.len(), 2);
        assert_eq!(record.threshold[0], vec![100]);
        assert!(record.threshold[1].is_empty());
    }
}
