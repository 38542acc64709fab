use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{OccludeError, OccludeResult};

/// One registered font face.
#[derive(Clone)]
pub struct FontFace {
    /// Family name as reported by the font's name table.
    pub family: String,
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Registry of font bytes keyed by family name (case-insensitive).
///
/// Nothing is loaded implicitly: the host registers the fonts it offers in its font picker.
/// Families that are not registered fall back to the built-in bitmap face at raster time.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: BTreeMap<String, FontFace>,
}

impl FontBook {
    /// Empty book; every family resolves to the bitmap fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw font bytes and return the detected family name.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> OccludeResult<String> {
        let mut ctx = parley::FontContext::default();
        let families = ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            OccludeError::validation("no font families registered from font bytes")
        })?;
        let family = ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OccludeError::validation("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family, bytes = bytes.len(), "registered font");
        self.faces.insert(
            family.to_lowercase(),
            FontFace {
                family: family.clone(),
                bytes: Arc::new(bytes),
            },
        );
        Ok(family)
    }

    /// Read and register a single font file.
    pub fn load_file(&mut self, path: &Path) -> OccludeResult<String> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        self.register_bytes(bytes)
    }

    /// Register every `.ttf`/`.otf`/`.ttc` file directly inside `dir`.
    ///
    /// Unreadable or unparsable files are skipped. Returns the number of faces registered.
    pub fn load_dir(&mut self, dir: &Path) -> OccludeResult<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read font dir '{}'", dir.display()))?;
        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
            if !is_font {
                continue;
            }
            match self.load_file(&path) {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping font"),
            }
        }
        Ok(loaded)
    }

    /// Look up a family by name, ignoring case.
    pub fn resolve(&self, family: &str) -> Option<&FontFace> {
        self.faces.get(&family.trim().to_lowercase())
    }

    /// Registered family names in sorted order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.values().map(|f| f.family.as_str())
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether no face is registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
