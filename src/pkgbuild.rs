//! `pkgbuild` invocation
//!
//! [`PkgbuildArgs`] turns the resolved build inputs into an argument list, and
//! a [`CommandRunner`] executes it. The runner is a trait so tests can record
//! the invocation instead of needing macOS.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PkgError, Result};
use crate::options::Ownership;
use crate::output;

/// Output file name: `<name>-<version>.pkg`
pub fn package_file_name(name: &str, version: &str) -> String {
    format!("{}-{}.pkg", name, version)
}

/// Arguments for one `pkgbuild` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgbuildArgs {
    pub root: PathBuf,
    pub identifier: String,
    pub version: String,
    pub scripts: Option<PathBuf>,
    pub ownership: Option<Ownership>,
    pub install_location: Option<PathBuf>,
    /// Path of the `.pkg` to write
    pub output: PathBuf,
}

impl PkgbuildArgs {
    /// Argument list in the order `pkgbuild` is invoked with.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--quiet".into(),
            "--root".into(),
            self.root.clone().into(),
            "--identifier".into(),
            self.identifier.clone().into(),
            "--version".into(),
            self.version.clone().into(),
        ];

        if let Some(ref scripts) = self.scripts {
            args.push("--scripts".into());
            args.push(scripts.clone().into());
        }
        if let Some(ownership) = self.ownership {
            args.push("--ownership".into());
            args.push(ownership.as_str().into());
        }
        if let Some(ref location) = self.install_location {
            args.push("--install-location".into());
            args.push(location.clone().into());
        }

        args.push(self.output.clone().into());
        args
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Run `program` with `args`; a non-zero exit is an error.
    fn run(&self, program: &Path, args: &[OsString]) -> Result<()>;
}

/// Spawns real processes, inheriting stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<()> {
        let cmd = display_command(program, args);
        output::debug(&cmd);

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| PkgError::CommandSpawn {
                cmd: program.display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(PkgError::CommandFailed {
                cmd,
                code: status.code(),
            });
        }
        Ok(())
    }
}

/// Render a command line for messages.
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut s = program.display().to_string();
    for arg in args {
        s.push(' ');
        s.push_str(&arg.to_string_lossy());
    }
    s
}

/// Run `pkgbuild` with a spinner.
pub fn run_pkgbuild(runner: &dyn CommandRunner, pkgbuild: &Path, args: &PkgbuildArgs) -> Result<()> {
    let argv = args.to_args();
    let pb = output::spinner(&format!("pkgbuild {}", args.output.display()));
    let result = runner.run(pkgbuild, &argv);
    output::progress_done(pb);
    result
}
