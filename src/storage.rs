//! Saved plans on disk.
//!
//! Each plan is one UTF-8 text file named `<YYYYMMDD_HHMMSS>_<slug>.txt`
//! inside a single directory. Files are written once and never deleted;
//! the history view lists and reads them.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::error::NutriaError;

/// Default directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "planes_nutricionales_guardados";

/// Slug used when the objective has no word characters.
pub const FALLBACK_SLUG: &str = "plan_personalizado";

pub const PLAN_EXTENSION: &str = "txt";

const MAX_SLUG_CHARS: usize = 30;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on `_N` suffixes tried when a name is already taken.
const MAX_SUFFIX: u32 = 1000;

static NON_WORD_RE: OnceLock<Regex> = OnceLock::new();

fn non_word_re() -> &'static Regex {
    NON_WORD_RE.get_or_init(|| Regex::new(r"\W+").expect("valid literal regex"))
}

/// Turn an objective into a filesystem-safe slug.
///
/// Runs of non-word characters collapse to `_`, the result is lower-cased,
/// edge underscores are trimmed and the slug is capped at 30 characters.
pub fn slugify(objective: &str) -> String {
    let collapsed = non_word_re().replace_all(objective, "_").to_lowercase();
    let capped: String = collapsed
        .trim_matches('_')
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect();
    let slug = capped.trim_end_matches('_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug.to_owned()
    }
}

/// Build the file name for a plan saved at `now`.
pub fn plan_file_name(objective: &str, now: NaiveDateTime) -> String {
    format!(
        "{}_{}.{PLAN_EXTENSION}",
        now.format(TIMESTAMP_FORMAT),
        slugify(objective)
    )
}

/// Directory-backed store for saved plans.
#[derive(Debug, Clone)]
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it is missing. Idempotent.
    pub fn ensure_dir(&self) -> Result<(), NutriaError> {
        fs::create_dir_all(&self.dir).map_err(|e| NutriaError::StorageDirFailed {
            path: self.dir.clone(),
            detail: e.to_string(),
        })
    }

    /// Save `plan_text` under a name derived from the current local time and
    /// `objective`. Returns the file name (not the full path).
    pub fn save(&self, plan_text: &str, objective: &str) -> Result<String, NutriaError> {
        self.save_at(plan_text, objective, Local::now().naive_local())
    }

    /// Same as [`PlanStore::save`] with an explicit timestamp.
    ///
    /// Never overwrites: when the name is taken, `_2`, `_3`, ... is appended
    /// to the stem until a free name is found.
    pub fn save_at(
        &self,
        plan_text: &str,
        objective: &str,
        now: NaiveDateTime,
    ) -> Result<String, NutriaError> {
        self.ensure_dir()?;

        let base = plan_file_name(objective, now);
        let stem = base
            .strip_suffix(&format!(".{PLAN_EXTENSION}"))
            .unwrap_or(&base)
            .to_owned();

        let mut name = base;
        let mut suffix = 1;
        loop {
            let path = self.dir.join(&name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut f) => {
                    f.write_all(plan_text.as_bytes())
                        .and_then(|()| f.flush())
                        .map_err(|e| NutriaError::PlanWriteFailed {
                            path: path.clone(),
                            detail: e.to_string(),
                        })?;
                    tracing::info!(file = %name, bytes = plan_text.len(), "plan saved");
                    return Ok(name);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && suffix < MAX_SUFFIX => {
                    suffix += 1;
                    tracing::debug!(taken = %name, "plan file name in use, trying next suffix");
                    name = format!("{stem}_{suffix}.{PLAN_EXTENSION}");
                }
                Err(e) => {
                    return Err(NutriaError::PlanWriteFailed {
                        path,
                        detail: e.to_string(),
                    });
                }
            }
        }
    }

    /// All saved plan names, most recent first.
    ///
    /// A missing directory yields an empty list; any other failure is an error
    /// the caller shows as a warning.
    pub fn list(&self) -> Result<Vec<String>, NutriaError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(NutriaError::PlanListFailed {
                    path: self.dir.clone(),
                    detail: e.to_string(),
                });
            }
        };

        let suffix = format!(".{PLAN_EXTENSION}");
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NutriaError::PlanListFailed {
                path: self.dir.clone(),
                detail: e.to_string(),
            })?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(&suffix) {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// One page of [`PlanStore::list`]; `page` is zero-based.
    pub fn list_page(&self, page: usize, page_size: usize) -> Result<Vec<String>, NutriaError> {
        Ok(self
            .list()?
            .into_iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .collect())
    }

    /// Read a saved plan by file name.
    pub fn read(&self, name: &str) -> Result<String, NutriaError> {
        if !is_bare_file_name(name) {
            return Err(NutriaError::InvalidPlanName {
                name: name.to_owned(),
            });
        }
        let path = self.dir.join(name);
        fs::read_to_string(&path).map_err(|e| NutriaError::PlanReadFailed {
            path,
            detail: e.to_string(),
        })
    }
}

/// Plan names are single path components; anything else could escape the
/// storage directory.
fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
