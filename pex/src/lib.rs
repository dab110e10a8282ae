//! Phrase extraction from bilingual screenshot pairs.
//!
//! A screenshot from the source app stacks one or more phrase blocks, each a
//! target-language sentence above its translation, with words of interest
//! marked by a pale-yellow highlight. This crate cuts the screenshot into
//! blocks, splits each block into its two halves, binarizes them, runs OCR,
//! and classifies every recognized word as tagged or not by sampling the
//! pixels directly above it.

mod config;
pub use config::*;
mod highlight;
pub use highlight::{ColorRange, TagScan};
mod image;
pub use image::*;
mod ocr;
pub use ocr::*;
mod record;
pub use record::*;
mod split;
pub use split::{block_ranges, find_split_row, white_bands};

/// The segmentation pipeline: parsing constants plus an OCR capability.
pub struct Pipeline<R> {
    config: ParseConfig,
    ocr: R,
}

impl<R: Recognizer> Pipeline<R> {
    pub fn new(config: ParseConfig, ocr: R) -> Self {
        Self { config, ocr }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Cut a screenshot into phrase records, one per qualifying block.
    ///
    /// Records come back in top-to-bottom order, `file_index` numbered from
    /// 1, each in state `Todo` (or `Error` when its block could not be split
    /// into halves). No OCR runs yet; call [`PhraseRecord::perform`] or use
    /// [`Pipeline::process`].
    pub fn segment(&self, image: &OwnedImage, meta: &RecordMeta) -> Vec<PhraseRecord> {
        let layout = self.config.layout_for(meta.message_date);
        let view = image.as_image();
        let margin = self.config.gutter_column;

        split::block_ranges(view, layout, &self.config)
            .into_iter()
            .enumerate()
            .map(|(index, (y1, y2))| {
                let block = view
                    .sub_image(
                        margin,
                        y1,
                        view.width().saturating_sub(margin * 2),
                        y2 - y1,
                    )
                    .to_owned_image();

                PhraseRecord::new(
                    block,
                    meta.clone(),
                    (index + 1) as u32,
                    (y1, y2),
                    layout,
                    &self.config,
                )
            })
            .collect()
    }

    /// Segment a screenshot and run extraction on every record.
    ///
    /// Errored records stay errored; siblings are unaffected (each record
    /// owns its crops exclusively).
    pub fn process(&self, image: &OwnedImage, meta: &RecordMeta) -> Vec<PhraseRecord> {
        let mut records = self.segment(image, meta);
        for record in &mut records {
            record.perform(&self.ocr, &self.config);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    struct FakeOcr;

    impl Recognizer for FakeOcr {
        fn text(&self, _image: Image<'_>) -> String {
            "ala ma kota".to_string()
        }

        fn word_boxes(&self, image: Image<'_>) -> Vec<WordBox> {
            // Boxes over the text stripe of whichever half was passed in;
            // three words matching the text's word count.
            let y1 = if image.height() > 70 { 15 } else { 34 };
            [(13u32, 19u32), (21, 27), (29, 41)]
                .iter()
                .map(|&(x1, x2)| WordBox {
                    content: "w".to_string(),
                    position: ((x1, y1), (x2, y1 + 12)),
                })
                .collect()
        }
    }

    /// Two stacked phrase blocks separated by tinted gutter rows. Each block
    /// spans 145 screenshot rows and contains two text stripes with a white
    /// separator band between them.
    fn screenshot() -> OwnedImage {
        let gray = Color::new(200, 200, 200);
        OwnedImage::from_fn(60, 320, |x, y| {
            let block_y = match y {
                10..=154 => y - 10,
                165..=309 => y - 165,
                _ => return gray,
            };
            if !(7..53).contains(&x) {
                return Color::WHITE;
            }
            let in_text_cols = (20..40).contains(&x);
            if in_text_cols && ((34..50).contains(&block_y) || (80..100).contains(&block_y)) {
                Color::BLACK
            } else {
                Color::WHITE
            }
        })
    }

    fn meta() -> RecordMeta {
        RecordMeta {
            meta_id: Some(1),
            message_id: 100,
            message_date: NaiveDateTime::parse_from_str(
                "2022-10-23T13:10:11",
                DATETIME_FORMAT,
            )
            .unwrap(),
        }
    }

    #[test]
    fn two_block_screenshot_yields_two_done_records() {
        let pipeline = Pipeline::new(ParseConfig::default(), FakeOcr);
        let records = pipeline.process(&screenshot(), &meta());

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.state(), State::Done);
            assert_eq!(record.target_mask().len(), 3);
            assert_eq!(record.translate_mask().len(), 3);
            assert_eq!(record.target_string(), "ala ma kota");
        }

        assert_eq!(records[0].file_index(), 1);
        assert_eq!(records[1].file_index(), 2);
        assert_eq!(records[0].coordinates(), (10, 155));
        assert_eq!(records[1].coordinates(), (165, 310));
    }

    #[test]
    fn blocks_are_cropped_with_gutter_margins() {
        let pipeline = Pipeline::new(ParseConfig::default(), FakeOcr);
        let records = pipeline.segment(&screenshot(), &meta());

        assert_eq!(records.len(), 2);
        // 60 wide minus a 7 px margin on each side.
        assert_eq!(records[0].image().width(), 46);
        assert_eq!(records[0].image().height(), 145);
    }

    #[test]
    fn segment_leaves_records_unperformed() {
        let pipeline = Pipeline::new(ParseConfig::default(), FakeOcr);
        let records = pipeline.segment(&screenshot(), &meta());

        assert!(records.iter().all(|r| r.state() == State::Todo));
        assert!(records.iter().all(|r| r.target_string().is_empty()));
    }
}
