//! OCR seam.
//!
//! The pipeline treats text recognition as an opaque capability: plain text
//! of an image, and a list of word boxes with pixel coordinates. Everything
//! downstream (tag detection in particular) depends only on the
//! [`Recognizer`] trait, so tests substitute a fake.
//!
//! The shipped implementation drives the external `tesseract` executable:
//! stdout for plain text, TSV output for word boxes. OCR quality varies
//! continuously; empty output and engine failures degrade to empty results
//! instead of erroring, and show up downstream as `success == false`.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

use crate::image::Image;

/// One OCR-recognized word and its bounding rectangle,
/// `((x1, y1), (x2, y2))` in pixel coordinates of the recognized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBox {
    pub content: String,
    pub position: ((u32, u32), (u32, u32)),
}

pub trait Recognizer {
    /// Plain text of the image. Empty output is valid.
    fn text(&self, image: Image<'_>) -> String;

    /// Word boxes of the image, in recognition order.
    ///
    /// Box coordinates must map 1:1 onto the passed image: the tag detector
    /// samples pixels of the raw counterpart at the same coordinates.
    fn word_boxes(&self, image: Image<'_>) -> Vec<WordBox>;
}

/// External `tesseract` process.
pub struct Tesseract {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    lang: String,
}

/// Crops below this height are upscaled before the plain-text pass; OCR
/// performs better on larger glyphs. Never applied to the word-box pass,
/// which must keep coordinates intact.
const MIN_TEXT_HEIGHT: u32 = 80;

impl Tesseract {
    pub fn new(executable: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            tessdata: None,
            lang: lang.into(),
        }
    }

    pub fn with_tessdata(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(dir.into());
        self
    }

    fn write_input(&self, image: Image<'_>, upscale: bool) -> Result<tempfile::NamedTempFile> {
        let input = tempfile::NamedTempFile::with_suffix(".png").context("create temp image")?;

        if upscale && image.height() < MIN_TEXT_HEIGHT {
            let scaled = image.to_owned_image().resized_h(MIN_TEXT_HEIGHT);
            scaled.save_png(input.path())?;
        } else {
            image.save_png(input.path())?;
        }

        Ok(input)
    }

    fn add_options(&self, cmd: &mut Command) {
        if let Some(dir) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.args(["-l", &self.lang, "--psm", "6"]);
    }

    fn run_text(&self, image: Image<'_>) -> Result<String> {
        let input = self.write_input(image, true)?;

        let mut cmd = Command::new(&self.executable);
        cmd.arg(input.path()).arg("stdout");
        self.add_options(&mut cmd);

        let output = cmd.output().context("spawn tesseract")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_word_boxes(&self, image: Image<'_>) -> Result<Vec<WordBox>> {
        let input = self.write_input(image, false)?;

        // Tesseract appends `.tsv` to the output base name.
        let output_base = tempfile::NamedTempFile::new().context("create temp output")?;
        let base = output_base.path().to_string_lossy().to_string();

        let mut cmd = Command::new(&self.executable);
        cmd.arg(input.path()).arg(&base);
        self.add_options(&mut cmd);
        cmd.arg("tsv");

        let output = cmd.output().context("spawn tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", base);
        let tsv = std::fs::read_to_string(&tsv_path)
            .with_context(|| format!("read tesseract output {}", tsv_path))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv(&tsv))
    }
}

impl Recognizer for Tesseract {
    fn text(&self, image: Image<'_>) -> String {
        match self.run_text(image) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "text recognition failed");
                String::new()
            }
        }
    }

    fn word_boxes(&self, image: Image<'_>) -> Vec<WordBox> {
        match self.run_word_boxes(image) {
            Ok(boxes) => boxes,
            Err(err) => {
                tracing::warn!(error = %err, "word-box recognition failed");
                Vec::new()
            }
        }
    }
}

/// Parse tesseract TSV output into word boxes.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words.
fn parse_tsv(tsv: &str) -> Vec<WordBox> {
    let mut boxes = Vec::new();

    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let left: u32 = fields[6].parse().unwrap_or(0);
        let top: u32 = fields[7].parse().unwrap_or(0);
        let width: u32 = fields[8].parse().unwrap_or(0);
        let height: u32 = fields[9].parse().unwrap_or(0);

        boxes.push(WordBox {
            content: text.to_string(),
            position: ((left, top), (left + width, top + height)),
        });
    }

    boxes
}
