use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf}
};
use tracing::{debug, info};
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{
    error::{LookupError, Result},
    pptx::package_parts,
    slides::SlideDeck
};

pub const DEFAULT_OUTPUT_FILE: &str = "publications.pptx";

// Utils to store the deck on local device.
pub struct LocalSaver;

impl LocalSaver {
    /// Writes the deck to a hidden sibling file and renames it into place,
    /// so `path` is either the complete deck or untouched.
    pub fn save_deck_as_pptx(path: &Path, deck: &SlideDeck, overwrite: bool) -> Result<()> {
        if path.exists() && !overwrite {
            return Err(LookupError::write(
                path.display().to_string(),
                "file already exists, rename or delete it (or pass --force)"
            ));
        }

        let partial = partial_path(path);
        let result = Self::write_pptx(&partial, deck)
            .and_then(|_| fs::rename(&partial, path).map_err(|e| {
                LookupError::write(path.display().to_string(), e.to_string())
            }));
        if result.is_err() {
            let _ = fs::remove_file(&partial);
        } else {
            info!(slides = deck.len(), "wrote {}", path.display());
        }
        result
    }

    fn write_pptx(path: &Path, deck: &SlideDeck) -> Result<()> {
        let fail = |message: String| LookupError::write(path.display().to_string(), message);

        let file = File::create(path).map_err(|e| fail(e.to_string()))?;
        let mut zip = ZipWriter::new(file);
        package_parts(deck).into_iter().try_for_each(|(name, xml)| -> Result<()> {
            debug!(part = %name, bytes = xml.len(), "adding part");
            zip.start_file(name, SimpleFileOptions::default()).map_err(|e| fail(e.to_string()))?;
            zip.write_all(xml.as_bytes()).map_err(|e| fail(e.to_string()))?;
            Ok(())
        })?;
        let mut file = zip.finish().map_err(|e| fail(e.to_string()))?;
        file.flush().map_err(|e| fail(e.to_string()))?;
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string());
    path.with_file_name(format!(".{}.part", name))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::slides::{Paragraph, Slide, SlideKind};

    fn deck() -> SlideDeck {
        SlideDeck {
            slides: vec![Slide {
                kind: SlideKind::Title,
                heading: Some("Journal Lookup Tool".to_string()),
                paragraphs: vec![Paragraph::new("Username: a@b.com", 16)]
            }]
        }
    }

    #[test]
    fn test_writes_zip_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publications.pptx");
        LocalSaver::save_deck_as_pptx(&path, &deck(), false).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut slide = String::new();
        archive.by_name("ppt/slides/slide1.xml").unwrap().read_to_string(&mut slide).unwrap();
        assert!(slide.contains("Username: a@b.com"));
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publications.pptx");
        fs::write(&path, b"keep me").unwrap();

        let err = LocalSaver::save_deck_as_pptx(&path, &deck(), false).unwrap_err();
        assert!(matches!(err, LookupError::Write { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");

        LocalSaver::save_deck_as_pptx(&path, &deck(), true).unwrap();
        assert_ne!(fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("publications.pptx");
        let err = LocalSaver::save_deck_as_pptx(&path, &deck(), false).unwrap_err();
        assert!(matches!(err, LookupError::Write { .. }));
        assert!(!path.exists());
    }
}
