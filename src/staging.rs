//! Staging root assembly
//!
//! The staging root is a temporary directory handed to `pkgbuild --root`. The
//! Homebrew prefix is mirrored inside it so that files land at the same paths
//! on the target machine.

use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

use crate::error::Result;
use crate::formula::FormulaRecord;
use crate::fs_utils;
use crate::output;

/// Keg subdirectories copied into the prefix.
pub const KEG_SUBDIRS: &[&str] = &["etc", "bin", "sbin", "include", "share", "lib", "Frameworks"];

/// System directory for launchd daemons, relative to the staging root.
pub const LAUNCH_DAEMONS_DIR: &str = "Library/LaunchDaemons";

/// What to stage for each formula besides its keg subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    /// Mirror `Cellar/<name>/<version>` so `brew` still sees the formula
    pub kegs: bool,
    /// Mirror the `opt/<name>` link
    pub opt_link: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            kegs: true,
            opt_link: true,
        }
    }
}

/// Temporary package root with the Homebrew prefix mirrored inside.
#[derive(Debug)]
pub struct StagingRoot {
    dir: TempDir,
    prefix_root: PathBuf,
    homebrew_prefix: PathBuf,
}

impl StagingRoot {
    /// Create a fresh `brew-pkg*` temp directory and the prefix mirror in it.
    pub fn create(homebrew_prefix: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("brew-pkg").tempdir()?;
        Self::with_dir(dir, homebrew_prefix)
    }

    /// Like [`StagingRoot::create`], inside `parent`.
    pub fn create_in(parent: &Path, homebrew_prefix: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("brew-pkg").tempdir_in(parent)?;
        Self::with_dir(dir, homebrew_prefix)
    }

    fn with_dir(dir: TempDir, homebrew_prefix: &Path) -> Result<Self> {
        let prefix_root = dir.path().join(relative_to_root(homebrew_prefix));
        std::fs::create_dir_all(&prefix_root)?;
        Ok(Self {
            dir,
            prefix_root,
            homebrew_prefix: homebrew_prefix.to_path_buf(),
        })
    }

    /// Directory passed to `pkgbuild --root`.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The Homebrew prefix inside the staging root.
    pub fn prefix_root(&self) -> &Path {
        &self.prefix_root
    }

    /// Keep the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }

    /// Remove the directory now, reporting failures.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }

    /// Copy one formula's files into the staging root.
    pub fn stage_formula(&self, formula: &FormulaRecord, opts: StageOptions) -> Result<()> {
        output::action(&format!("Staging formula {}", formula.name));
        output::debug(&format!("packaging formula {}", formula.name));

        if formula.keg.is_dir() {
            for sub in KEG_SUBDIRS {
                let src = formula.keg.join(sub);
                if src.is_dir() {
                    output::detail(&format!("{} -> {}", src.display(), self.prefix_root.display()));
                    fs_utils::copy_tree(&src, &self.prefix_root.join(sub))?;
                }
            }

            if opts.kegs {
                self.stage_keg(formula)?;
            }
        }

        if opts.opt_link {
            self.stage_opt_link(&formula.name)?;
        }

        if let Some(service) = &formula.service {
            let daemons = self.dir.path().join(LAUNCH_DAEMONS_DIR);
            let file = format!("{}.plist", service.name);
            output::action(&format!(
                "Plist found at {}, staging for /{}/{}",
                service.name, LAUNCH_DAEMONS_DIR, file
            ));
            std::fs::create_dir_all(&daemons)?;
            std::fs::write(daemons.join(file), &service.content)?;
        }

        Ok(())
    }

    // The mirror keeps the keg directory's own name (`1.0_0` stays `1.0_0`)
    // so the staged opt link still resolves.
    fn stage_keg(&self, formula: &FormulaRecord) -> Result<()> {
        let keg_dir = formula
            .keg
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(formula.display_version()));
        let dest = self
            .prefix_root
            .join("Cellar")
            .join(&formula.name)
            .join(keg_dir);
        output::action(&format!("Staging directory {}", formula.keg.display()));
        fs_utils::copy_tree(&formula.keg, &dest)
    }

    fn stage_opt_link(&self, name: &str) -> Result<()> {
        let link = self.homebrew_prefix.join("opt").join(name);
        if !link.is_symlink() {
            output::debug(&format!("no opt link at {}", link.display()));
            return Ok(());
        }
        output::action(&format!("Staging link {}", link.display()));
        fs_utils::copy_symlink(&link, &self.prefix_root.join("opt").join(name))
    }
}

/// `/usr/local` -> `usr/local`
fn relative_to_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
