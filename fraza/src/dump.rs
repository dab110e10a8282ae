//! Crop dumps.
//!
//! Writes a record's block and half crops (raw and binarized) next to the
//! source file, so a mis-split or mis-tagged screenshot can be inspected
//! without re-running anything.

use std::path::{Path, PathBuf};

use anyhow::Result;

use pex::PhraseRecord;

pub fn dump_crops(record: &PhraseRecord, source: &Path) -> Result<()> {
    let index = record.file_index();

    record.image().save_png(named(source, index, ""))?;
    record.target_image().save_png(named(source, index, ".target"))?;
    record.target_bin().save_png(named(source, index, ".target.gray"))?;
    record.translate_image().save_png(named(source, index, ".translate"))?;
    record.translate_bin().save_png(named(source, index, ".translate.gray"))?;

    tracing::info!(source = %source.display(), index, "dumped crops");
    Ok(())
}

fn named(source: &Path, index: u32, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crop".to_string());

    source.with_file_name(format!("{}-{}{}.png", stem, index, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_names_carry_index_and_suffix() {
        let source = Path::new("/data/photo_232@23-10-2022.jpg");

        assert_eq!(
            named(source, 2, ""),
            PathBuf::from("/data/photo_232@23-10-2022-2.png")
        );
        assert_eq!(
            named(source, 2, ".target.gray"),
            PathBuf::from("/data/photo_232@23-10-2022-2.target.gray.png")
        );
    }
}
