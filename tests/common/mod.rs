//! Shared fixtures: a fake Homebrew prefix and a recording command runner.

#![allow(dead_code)]

use brew_pkg::error::Result;
use brew_pkg::{CommandRunner, Config, PkgError};
use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A Homebrew prefix on disk with its own Cellar.
pub struct FakeBrew {
    pub dir: TempDir,
}

impl FakeBrew {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("prefix/Cellar")).unwrap();
        std::fs::create_dir_all(dir.path().join("prefix/opt")).unwrap();
        std::fs::create_dir_all(dir.path().join("staging")).unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        Self { dir }
    }

    pub fn prefix(&self) -> PathBuf {
        self.dir.path().join("prefix")
    }

    pub fn cellar(&self) -> PathBuf {
        self.prefix().join("Cellar")
    }

    /// The prefix as mirrored inside a staging root, e.g. `tmp/.tmpX/prefix`.
    pub fn prefix_in_root(&self, rel: &str) -> String {
        let prefix = self.prefix();
        let mirrored = prefix.strip_prefix("/").unwrap_or(&prefix);
        format!("{}/{}", mirrored.display(), rel)
    }

    pub fn staging_parent(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn config(&self) -> Config {
        Config {
            identifier_prefix: "org.homebrew".into(),
            homebrew_prefix: self.prefix(),
            homebrew_cellar: self.cellar(),
            pkgbuild: PathBuf::from("pkgbuild"),
        }
    }

    /// Install a keg `<name>/<keg_version>` with a binary, a lib and an opt link.
    pub fn install(&self, name: &str, keg_version: &str, deps: &[&str]) -> PathBuf {
        let keg = self.cellar().join(name).join(keg_version);
        std::fs::create_dir_all(keg.join("bin")).unwrap();
        std::fs::create_dir_all(keg.join("lib")).unwrap();
        std::fs::write(keg.join("bin").join(name), format!("#!/bin/sh\necho {}\n", name)).unwrap();
        std::fs::write(keg.join("lib").join(format!("lib{}.dylib", name)), "lib").unwrap();

        let deps_json = deps
            .iter()
            .map(|d| format!(r#"{{"full_name":"{}","version":"1.0"}}"#, d))
            .collect::<Vec<_>>()
            .join(",");
        std::fs::write(
            keg.join("INSTALL_RECEIPT.json"),
            format!(r#"{{"runtime_dependencies":[{}]}}"#, deps_json),
        )
        .unwrap();

        #[cfg(unix)]
        std::os::unix::fs::symlink(
            format!("../Cellar/{}/{}", name, keg_version),
            self.prefix().join("opt").join(name),
        )
        .unwrap();

        keg
    }

    /// Remaining entries in the staging parent directory.
    pub fn staging_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_parent())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect()
    }
}

/// A `pkgbuild` invocation captured by [`RecordingRunner`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Files under `--root` at the time of the call, relative to it
    pub staged: Vec<PathBuf>,
}

impl Invocation {
    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    pub fn output(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }

    pub fn staged(&self, rel: &str) -> bool {
        self.staged.iter().any(|p| p == Path::new(rel))
    }
}

/// Records invocations instead of spawning processes.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: RefCell<Vec<Invocation>>,
    pub fail_with: Option<i32>,
}

impl RecordingRunner {
    pub fn failing(code: i32) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_with: Some(code),
        }
    }

    pub fn single(&self) -> Invocation {
        let calls = self.calls.borrow();
        assert_eq!(calls.len(), 1, "expected exactly one pkgbuild call");
        calls[0].clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<()> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let staged = args
            .iter()
            .position(|a| a == "--root")
            .and_then(|i| args.get(i + 1))
            .map(|root| {
                walkdir::WalkDir::new(root)
                    .min_depth(1)
                    .into_iter()
                    .flatten()
                    .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
                    .collect()
            })
            .unwrap_or_default();

        self.calls.borrow_mut().push(Invocation {
            program: program.to_path_buf(),
            args,
            staged,
        });

        match self.fail_with {
            Some(code) => Err(PkgError::CommandFailed {
                cmd: program.display().to_string(),
                code: Some(code),
            }),
            None => Ok(()),
        }
    }
}
