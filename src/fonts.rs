use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::Result;
use crate::file_utils::FileManager;

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

// File stems of commonly bundled caption fonts and the name users know them by
const DISPLAY_NAMES: [(&str, &str); 7] = [
    ("CheGuevaraBarry-Brown", "CheGuevara Barry"),
    ("FiraSansCondensed-ExtraBoldItalic", "Fira Sans Condensed"),
    ("Gabarito-Black", "Gabarito"),
    ("KOMIKAX_", "Komika Axis"),
    ("Montserrat-Bold", "Montserrat"),
    ("Proxima-Nova-Semibold", "Proxima Nova"),
    ("Rubik-ExtraBold", "Rubik"),
];

/// Maps font display names to font files on disk
#[derive(Debug, Default, Clone)]
pub struct FontRegistry {
    fonts: BTreeMap<String, PathBuf>,
}

impl FontRegistry {
    /// Registry over the given directory only
    pub fn scan<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut registry = Self::default();
        registry.add_dir(dir.as_ref())?;
        Ok(registry)
    }

    /// Registry over an optional configured directory plus the user font dir
    ///
    /// Directories that cannot be read are skipped with a warning.
    pub fn discover(configured: Option<&Path>) -> Self {
        let mut registry = Self::default();
        let dirs = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(dirs::font_dir());

        for dir in dirs {
            if !dir.is_dir() {
                continue;
            }
            if let Err(e) = registry.add_dir(&dir) {
                warn!("Skipping font directory {:?}: {}", dir, e);
            }
        }
        registry
    }

    fn add_dir(&mut self, dir: &Path) -> Result<()> {
        for file in FileManager::find_files(dir, &FONT_EXTENSIONS)? {
            let Some(stem) = file.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let name = display_name(&stem);
            debug!("Font {:?} -> {:?}", name, file);
            // First directory wins
            self.fonts.entry(name).or_insert(file);
        }
        Ok(())
    }

    /// Font file for a display name or file stem, case-insensitive
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        let wanted = name.trim();
        self.fonts
            .iter()
            .find(|(display, path)| {
                display.eq_ignore_ascii_case(wanted)
                    || path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(wanted))
            })
            .map(|(_, path)| path.as_path())
    }

    pub fn names(&self) -> Vec<&str> {
        self.fonts.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn display_name(stem: &str) -> String {
    DISPLAY_NAMES
        .iter()
        .find(|(file_stem, _)| *file_stem == stem)
        .map(|(_, display)| display.to_string())
        .unwrap_or_else(|| stem.to_string())
}
