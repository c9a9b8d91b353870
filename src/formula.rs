//! Installed formula lookup
//!
//! [`FormulaResolver`] is the narrow seam between the build pipeline and the
//! Homebrew installation. [`CellarResolver`] answers it by reading the Cellar
//! directly: keg directories, the `opt/` links, install receipts and the
//! launchd plists Homebrew writes into each keg.

use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::{PkgError, Result};
use crate::output;

/// Receipt written by `brew install` into every keg.
pub const INSTALL_RECEIPT: &str = "INSTALL_RECEIPT.json";

/// A launchd plist shipped with a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Label and file stem, e.g. `homebrew.mxcl.nginx`
    pub name: String,
    /// Plist content, written verbatim
    pub content: String,
}

/// Metadata for an installed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRecord {
    pub name: String,
    pub version: String,
    pub revision: u32,
    /// Installed version directory, `<cellar>/<name>/<keg dir>`
    pub keg: PathBuf,
    /// Runtime dependency names as recorded at install time
    pub dependencies: Vec<String>,
    pub service: Option<ServiceDefinition>,
}

impl FormulaRecord {
    /// Version with a `_<revision>` suffix when the revision is non-zero.
    pub fn display_version(&self) -> String {
        display_version(&self.version, self.revision)
    }
}

/// Join version and revision the way Homebrew names keg directories.
pub fn display_version(version: &str, revision: u32) -> String {
    if revision == 0 {
        version.to_string()
    } else {
        format!("{}_{}", version, revision)
    }
}

/// Split a keg directory name into version and revision.
///
/// `1.2_3` is version `1.2` revision `3`; a suffix that is not purely numeric
/// stays part of the version.
pub fn split_keg_version(dir_name: &str) -> (String, u32) {
    if let Some((version, rev)) = dir_name.rsplit_once('_')
        && !version.is_empty()
        && !rev.is_empty()
        && rev.bytes().all(|b| b.is_ascii_digit())
        && let Ok(revision) = rev.parse::<u32>()
    {
        return (version.to_string(), revision);
    }
    (dir_name.to_string(), 0)
}

/// Strip a tap qualifier: `homebrew/core/wget` -> `wget`.
pub fn short_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

/// Looks up installed formulae by name.
pub trait FormulaResolver {
    /// Metadata for `name`, or [`PkgError::NotInstalled`].
    fn resolve(&self, name: &str) -> Result<FormulaRecord>;
}

/// All installed dependencies of `record`, breadth-first and without
/// duplicates. A dependency that is no longer installed is skipped with a
/// warning.
///
/// Receipts from recent Homebrew versions already list the full closure; older
/// receipts are completed by walking each dependency's own receipt.
pub fn recursive_dependencies(
    resolver: &dyn FormulaResolver,
    record: &FormulaRecord,
) -> Result<Vec<FormulaRecord>> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(record.name.clone());

    let mut queue: VecDeque<String> = record.dependencies.iter().cloned().collect();
    let mut result = Vec::new();

    while let Some(dep) = queue.pop_front() {
        let name = short_name(&dep).to_string();
        if !seen.insert(name.clone()) {
            continue;
        }
        let dep_record = match resolver.resolve(&dep) {
            Ok(r) => r,
            Err(PkgError::NotInstalled { name }) => {
                output::warning(&format!("Dependency {} is not installed, skipping", name));
                continue;
            }
            Err(e) => return Err(e),
        };
        queue.extend(dep_record.dependencies.iter().cloned());
        result.push(dep_record);
    }

    Ok(result)
}

#[derive(Debug, Deserialize, Default)]
struct InstallReceipt {
    #[serde(default)]
    runtime_dependencies: Option<Vec<ReceiptDependency>>,
}

#[derive(Debug, Deserialize)]
struct ReceiptDependency {
    full_name: String,
}

/// Resolves formulae from a Homebrew prefix and Cellar on disk.
#[derive(Debug, Clone)]
pub struct CellarResolver {
    prefix: PathBuf,
    cellar: PathBuf,
}

impl CellarResolver {
    pub fn new(prefix: impl Into<PathBuf>, cellar: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            cellar: cellar.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn cellar(&self) -> &Path {
        &self.cellar
    }

    /// `<prefix>/opt/<name>`
    pub fn opt_link(&self, name: &str) -> PathBuf {
        self.prefix.join("opt").join(name)
    }

    /// The keg to package: the `opt/` link's target when present, otherwise
    /// the most recently installed version directory.
    fn find_keg(&self, name: &str) -> Option<PathBuf> {
        let rack = self.cellar.join(name);
        if !rack.is_dir() {
            return None;
        }

        if let Ok(target) = std::fs::read_link(self.opt_link(name))
            && let Some(version) = target.file_name()
        {
            let keg = rack.join(version);
            if keg.is_dir() {
                return Some(keg);
            }
        }

        let entries = std::fs::read_dir(&rack).ok()?;
        entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .max_by_key(|e| e.metadata().and_then(|m| m.modified()).ok())
            .map(|e| e.path())
    }

    /// Runtime dependencies from the keg's receipt. A missing or unreadable
    /// receipt yields none; the unreadable case warns.
    fn read_dependencies(keg: &Path) -> Vec<String> {
        let path = keg.join(INSTALL_RECEIPT);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                output::warning(&format!("Failed to read {}: {}", path.display(), e));
                return Vec::new();
            }
        };
        match serde_json::from_str::<InstallReceipt>(&content) {
            Ok(receipt) => receipt
                .runtime_dependencies
                .unwrap_or_default()
                .into_iter()
                .map(|d| d.full_name)
                .collect(),
            Err(source) => {
                output::warning(&PkgError::Receipt { path, source }.to_string());
                Vec::new()
            }
        }
    }

    fn read_service(keg: &Path, name: &str) -> Result<Option<ServiceDefinition>> {
        let plist_name = format!("homebrew.mxcl.{}", name);
        let path = keg.join(format!("{}.plist", plist_name));
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(ServiceDefinition {
            name: plist_name,
            content: std::fs::read_to_string(&path)?,
        }))
    }
}

impl FormulaResolver for CellarResolver {
    fn resolve(&self, name: &str) -> Result<FormulaRecord> {
        let name = short_name(name);
        let keg = self.find_keg(name).ok_or_else(|| PkgError::NotInstalled {
            name: name.to_string(),
        })?;

        let dir_name = keg
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (version, revision) = split_keg_version(&dir_name);

        Ok(FormulaRecord {
            name: name.to_string(),
            version,
            revision,
            dependencies: Self::read_dependencies(&keg),
            service: Self::read_service(&keg, name)?,
            keg,
        })
    }
}
