//! Attachment file organization
//!
//! Resolves where each attachment lives in the source tree and, when
//! organizing, where it goes in the destination tree:
//!
//! ```text
//! <root>/<year>/<first author>/<title>_<year><ext>
//! ```
//!
//! An occupied destination holding the same bytes is reused. One holding
//! different bytes is never overwritten; numbered variants `_2` .. `_N` are
//! tried next, then a name keyed by the publication's source identifier.
//!
//! Statistics, missing paths and planned destinations recorded for a
//! publication whose import is rolled back are forgotten again. Files
//! already copied stay on disk and are found there as occupants.

use super::fingerprint::ContentIndex;
use super::sanitize::{sanitize_author, sanitize_component, sanitize_title, EMPTY_COMPONENT};
use crate::config::MigrationConfig;
use crate::core::import::summary::FileStats;
use crate::domain::{Result, SourceDocument};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory used when a publication has no author
pub const NO_AUTHOR: &str = "NoAuthor";

/// Publication metadata that drives the destination name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub source_id: String,
    pub title: Option<String>,
    pub first_author: Option<String>,
    pub year: Option<i32>,
}

impl FileMeta {
    pub fn from_document(doc: &SourceDocument) -> Self {
        Self {
            source_id: doc.uuid.as_str().to_string(),
            title: doc.title.clone(),
            first_author: doc.first_author_name(),
            year: doc.year(),
        }
    }

    fn year_label(&self) -> String {
        self.year
            .map(|y| y.to_string())
            .unwrap_or_else(|| EMPTY_COMPONENT.to_string())
    }
}

/// A resolved source/destination pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSlot {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// The destination already holds these bytes; nothing is copied
    pub duplicate: bool,
}

/// What happened to one attachment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Placed in the organized tree
    Placed(FileSlot),
    /// Found, and linked where it is (not organizing)
    Linked(PathBuf),
    /// The source file does not exist
    Missing(PathBuf),
    /// The file exists but could not be hashed or copied
    Failed { source: PathBuf, reason: String },
}

impl FileOutcome {
    /// Path to record on the attachment, if there is a usable file
    pub fn stored_path(&self) -> Option<&Path> {
        match self {
            FileOutcome::Placed(slot) => Some(&slot.destination),
            FileOutcome::Linked(path) => Some(path),
            FileOutcome::Missing(_) | FileOutcome::Failed { .. } => None,
        }
    }
}

enum Occupancy {
    Free,
    Same,
    Different,
}

/// State as of the last committed publication
#[derive(Debug, Default)]
struct Checkpoint {
    stats: FileStats,
    missing: usize,
    /// Destinations first planned since the checkpoint
    planned: Vec<PathBuf>,
}

/// Run-scoped attachment resolver
pub struct FileOrganizer {
    attachments_root: Option<PathBuf>,
    target_root: Option<PathBuf>,
    max_variant: u32,
    dry_run: bool,
    index: ContentIndex,
    /// Destinations assigned this run, with the source placed there
    planned: HashMap<PathBuf, PathBuf>,
    stats: FileStats,
    missing: Vec<PathBuf>,
    checkpoint: Checkpoint,
}

impl FileOrganizer {
    /// Creates an organizer. With no `target_root`, files are only located.
    pub fn new(
        attachments_root: Option<PathBuf>,
        target_root: Option<PathBuf>,
        max_variant: u32,
        dry_run: bool,
    ) -> Self {
        Self {
            attachments_root,
            target_root,
            max_variant,
            dry_run,
            index: ContentIndex::new(),
            planned: HashMap::new(),
            stats: FileStats::default(),
            missing: Vec::new(),
            checkpoint: Checkpoint::default(),
        }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(
            config.source.attachments_root.clone(),
            config.organize_root().map(Path::to_path_buf),
            config.files.max_numbered_variant,
            config.import.dry_run,
        )
    }

    pub fn is_organizing(&self) -> bool {
        self.target_root.is_some()
    }

    pub fn stats(&self) -> FileStats {
        self.stats
    }

    /// Missing source paths seen so far, in order
    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    pub fn take_missing(&mut self) -> Vec<PathBuf> {
        self.checkpoint.missing = 0;
        std::mem::take(&mut self.missing)
    }

    /// Keeps everything resolved since the last checkpoint.
    pub fn commit_record(&mut self) {
        self.checkpoint = Checkpoint {
            stats: self.stats,
            missing: self.missing.len(),
            planned: Vec::new(),
        };
    }

    /// Forgets everything resolved since the last checkpoint; the publication
    /// was rolled back.
    pub fn discard_record(&mut self) {
        for destination in self.checkpoint.planned.drain(..) {
            self.planned.remove(&destination);
        }
        self.stats = self.checkpoint.stats;
        self.missing.truncate(self.checkpoint.missing);
    }

    /// Locates `raw_path` and, when organizing, places it.
    pub fn resolve(&mut self, raw_path: &str, meta: &FileMeta) -> FileOutcome {
        let source = match self.locate(raw_path) {
            Ok(path) => path,
            Err(missing) => {
                self.stats.missing += 1;
                tracing::warn!(
                    source_id = %meta.source_id,
                    path = %missing.display(),
                    "Attachment file missing"
                );
                self.missing.push(missing.clone());
                return FileOutcome::Missing(missing);
            }
        };
        self.stats.found += 1;

        let Some(root) = self.target_root.clone() else {
            return FileOutcome::Linked(source);
        };

        match self.place(&root, &source, meta) {
            Ok(slot) => FileOutcome::Placed(slot),
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(
                    source_id = %meta.source_id,
                    path = %source.display(),
                    error = %e,
                    "Attachment file could not be placed"
                );
                FileOutcome::Failed {
                    source,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Finds the source file, as given or under the attachments root.
    fn locate(&self, raw_path: &str) -> std::result::Result<PathBuf, PathBuf> {
        let given = PathBuf::from(raw_path);
        if given.is_file() {
            return Ok(given);
        }
        match &self.attachments_root {
            Some(root) if given.is_relative() => {
                let joined = root.join(&given);
                if joined.is_file() {
                    Ok(joined)
                } else {
                    Err(joined)
                }
            }
            _ => Err(given),
        }
    }

    fn place(&mut self, root: &Path, source: &Path, meta: &FileMeta) -> Result<FileSlot> {
        let slot = self.assign(root, source, meta)?;
        if slot.duplicate {
            self.stats.duplicates += 1;
            tracing::debug!(
                source = %source.display(),
                destination = %slot.destination.display(),
                "Identical file already in place"
            );
        } else {
            if !self.dry_run {
                if let Some(parent) = slot.destination.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(source, &slot.destination)?;
            }
            self.stats.copied += 1;
            tracing::debug!(
                source = %source.display(),
                destination = %slot.destination.display(),
                dry_run = self.dry_run,
                "Attachment file copied"
            );
        }
        if self
            .planned
            .insert(slot.destination.clone(), source.to_path_buf())
            .is_none()
        {
            self.checkpoint.planned.push(slot.destination.clone());
        }
        Ok(slot)
    }

    /// Picks the destination for `source` without touching the filesystem.
    fn assign(&mut self, root: &Path, source: &Path, meta: &FileMeta) -> Result<FileSlot> {
        let dir = destination_dir(root, meta);
        let stem = format!(
            "{}_{}",
            sanitize_title(meta.title.as_deref().unwrap_or_default()),
            meta.year_label()
        );
        let ext = extension(source);

        let numbered = (2..=self.max_variant).map(|n| format!("{stem}_{n}"));
        for name in std::iter::once(stem.clone()).chain(numbered) {
            let candidate = dir.join(format!("{name}{ext}"));
            match self.occupancy(&candidate, source)? {
                Occupancy::Free => return Ok(slot(source, candidate, false)),
                Occupancy::Same => return Ok(slot(source, candidate, true)),
                Occupancy::Different => {}
            }
        }

        let keyed = format!("{stem}_{}", sanitize_component(&meta.source_id, 64));
        let candidate = dir.join(format!("{keyed}{ext}"));
        match self.occupancy(&candidate, source)? {
            Occupancy::Free => return Ok(slot(source, candidate, false)),
            Occupancy::Same => return Ok(slot(source, candidate, true)),
            Occupancy::Different => {}
        }

        // Same publication, different file: the content hash keeps it unique.
        let hash = self.index.full_hash(source)?;
        let candidate = dir.join(format!("{keyed}_{}{ext}", &hash[..12]));
        let duplicate = matches!(self.occupancy(&candidate, source)?, Occupancy::Same);
        Ok(slot(source, candidate, duplicate))
    }

    fn occupancy(&mut self, candidate: &Path, source: &Path) -> Result<Occupancy> {
        let occupant = match self.planned.get(candidate) {
            Some(planned) => planned.clone(),
            None if candidate.exists() => candidate.to_path_buf(),
            None => return Ok(Occupancy::Free),
        };
        if self.index.same_content(source, &occupant)? {
            Ok(Occupancy::Same)
        } else {
            Ok(Occupancy::Different)
        }
    }
}

fn slot(source: &Path, destination: PathBuf, duplicate: bool) -> FileSlot {
    FileSlot {
        source: source.to_path_buf(),
        destination,
        duplicate,
    }
}

fn destination_dir(root: &Path, meta: &FileMeta) -> PathBuf {
    let author = meta
        .first_author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .map(sanitize_author)
        .unwrap_or_else(|| NO_AUTHOR.to_string());
    root.join(meta.year_label()).join(author)
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
