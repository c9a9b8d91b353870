//! Installer script resolution
//!
//! `pkgbuild --scripts` expects a directory holding executables named exactly
//! `preinstall` and `postinstall`. They come either from a user directory used
//! in place, or from individual files copied into a temporary directory.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::Result;
use crate::fs_utils;
use crate::output;

pub const PREINSTALL: &str = "preinstall";
pub const POSTINSTALL: &str = "postinstall";

const SCRIPT_MODE: u32 = 0o755;

/// Where scripts come from for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSources {
    /// Directory containing `preinstall` and/or `postinstall`
    pub dir: Option<PathBuf>,
    pub preinstall: Option<PathBuf>,
    pub postinstall: Option<PathBuf>,
}

/// A scripts directory ready to hand to `pkgbuild`.
#[derive(Debug)]
pub struct ResolvedScripts {
    path: PathBuf,
    // Owns the directory when the scripts were copied in.
    temp: Option<TempDir>,
}

impl ResolvedScripts {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory is temporary and removed on drop.
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Leave a temporary scripts directory on disk.
    pub fn keep(self) -> PathBuf {
        match self.temp {
            Some(temp) => temp.keep(),
            None => self.path,
        }
    }
}

/// Resolve scripts for `<name>-<version>`.
///
/// Individually given files take precedence over a scripts directory. Missing
/// scripts are warnings; `None` means no `--scripts` argument should be passed.
pub fn resolve_scripts(
    sources: &ScriptSources,
    name: &str,
    version: &str,
) -> Result<Option<ResolvedScripts>> {
    let from_dir = match &sources.dir {
        Some(dir) => scripts_from_dir(dir)?,
        None => None,
    };

    let from_files = scripts_from_files(
        sources.preinstall.as_deref(),
        sources.postinstall.as_deref(),
        name,
        version,
    )?;

    Ok(from_files.or(from_dir))
}

fn scripts_from_dir(dir: &Path) -> Result<Option<ResolvedScripts>> {
    let mut found = false;

    if dir.is_dir() {
        for script in [PREINSTALL, POSTINSTALL] {
            let path = dir.join(script);
            if path.is_file() {
                fs_utils::set_mode(&path, SCRIPT_MODE)?;
                output::action(&format!("Adding {} script", script));
                found = true;
            }
        }
    }

    if !found {
        output::warning(&format!("No scripts found in {}", dir.display()));
        return Ok(None);
    }

    Ok(Some(ResolvedScripts {
        path: dir.to_path_buf(),
        temp: None,
    }))
}

fn scripts_from_files(
    preinstall: Option<&Path>,
    postinstall: Option<&Path>,
    name: &str,
    version: &str,
) -> Result<Option<ResolvedScripts>> {
    let mut temp: Option<TempDir> = None;

    for (source, script) in [(preinstall, PREINSTALL), (postinstall, POSTINSTALL)] {
        let Some(source) = source else { continue };
        if !source.is_file() {
            output::warning(&format!(
                "{} script {} not found, ignoring",
                script,
                source.display()
            ));
            continue;
        }

        let dir = match temp.as_ref() {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                let created = tempfile::Builder::new()
                    .prefix(&format!("{}-{}-scripts", name, version))
                    .tempdir()?;
                let path = created.path().to_path_buf();
                temp = Some(created);
                path
            }
        };

        let dest = dir.join(script);
        fs_utils::copy_file(source, &dest)?;
        fs_utils::set_mode(&dest, SCRIPT_MODE)?;
        output::action(&format!("Adding {} script", script));
    }

    Ok(temp.map(|t| ResolvedScripts {
        path: t.path().to_path_buf(),
        temp: Some(t),
    }))
}
