//! Package build pipeline
//!
//! Resolve the formula, stage it (and optionally its dependencies), resolve
//! scripts, then run `pkgbuild` and clean up.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::formula::{self, FormulaResolver};
use crate::options::PkgOptions;
use crate::output;
use crate::pkgbuild::{self, CommandRunner, PkgbuildArgs};
use crate::scripts::{self, ScriptSources};
use crate::staging::{StageOptions, StagingRoot};

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// The `.pkg` written by `pkgbuild`
    pub package: PathBuf,
    /// Arguments `pkgbuild` was invoked with
    pub args: PkgbuildArgs,
    /// Staging root left on disk with `--keep-staging`
    pub kept_staging: Option<PathBuf>,
}

/// Builds installer packages from installed formulae.
pub struct PackageBuilder<'a> {
    config: &'a Config,
    resolver: &'a dyn FormulaResolver,
    runner: &'a dyn CommandRunner,
    staging_parent: Option<PathBuf>,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(
        config: &'a Config,
        resolver: &'a dyn FormulaResolver,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            resolver,
            runner,
            staging_parent: None,
        }
    }

    /// Create staging roots under `dir` instead of the system temp directory.
    pub fn staging_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_parent = Some(dir.into());
        self
    }

    /// Run the whole pipeline for `opts.formula`.
    pub fn build(&self, opts: &PkgOptions) -> Result<BuildOutcome> {
        output::debug(&format!("brew-pkg {}", opts.formula));

        // Fails before anything touches the filesystem.
        let primary = self.resolver.resolve(&opts.formula)?;

        let name = primary.name.clone();
        let identifier_prefix = opts
            .identifier_prefix
            .as_deref()
            .unwrap_or(&self.config.identifier_prefix);
        let identifier = format!("{}.{}", identifier_prefix, name);
        let version = opts
            .pkgvers
            .clone()
            .unwrap_or_else(|| primary.display_version());

        let mut formulae = vec![primary];
        if opts.with_deps {
            let deps = formula::recursive_dependencies(self.resolver, &formulae[0])?;
            formulae.extend(deps);
        }

        output::action(&format!(
            "Creating package staging root using Homebrew prefix {}",
            self.config.homebrew_prefix.display()
        ));
        let staging = match &self.staging_parent {
            Some(parent) => StagingRoot::create_in(parent, &self.config.homebrew_prefix)?,
            None => StagingRoot::create(&self.config.homebrew_prefix)?,
        };

        let stage_opts = StageOptions {
            kegs: !opts.without_kegs,
            opt_link: opts.stage_opt_link(),
        };
        for f in &formulae {
            staging.stage_formula(f, stage_opts)?;
        }

        let sources = ScriptSources {
            dir: opts.scripts.clone(),
            preinstall: opts.preinstall_script.clone(),
            postinstall: opts.postinstall_script.clone(),
        };
        let resolved_scripts = scripts::resolve_scripts(&sources, &name, &version)?;

        if let Some(mode) = opts.ownership {
            output::action(&format!(
                "Setting pkgbuild option --ownership with value {}",
                mode
            ));
        }
        if let Some(ref location) = opts.install_location {
            output::action(&format!(
                "Setting install directory option --install-location with value {}",
                location.display()
            ));
        }

        let file_name = pkgbuild::package_file_name(&name, &version);
        let package = match &opts.output_dir {
            Some(dir) => dir.join(&file_name),
            None => PathBuf::from(&file_name),
        };

        let args = PkgbuildArgs {
            root: staging.path().to_path_buf(),
            identifier,
            version,
            scripts: resolved_scripts.as_ref().map(|s| s.path().to_path_buf()),
            ownership: opts.ownership,
            install_location: opts.install_location.clone(),
            output: package.clone(),
        };

        output::action(&format!("Building package {}", file_name));
        pkgbuild::run_pkgbuild(self.runner, &self.config.pkgbuild, &args)?;

        let kept_staging = if opts.keep_staging {
            let kept = staging.keep();
            output::action(&format!("Staging root kept at {}", kept.display()));
            if let Some(scripts) = resolved_scripts.filter(|s| s.is_temporary()) {
                let path = scripts.keep();
                output::detail(&format!("scripts kept at {}", path.display()));
            }
            Some(kept)
        } else {
            remove_staging(staging);
            None
        };

        output::success(&format!("Built {}", package.display()));
        Ok(BuildOutcome {
            package,
            args,
            kept_staging,
        })
    }
}

// Best effort: the package already exists, so a leftover temp dir only warns.
fn remove_staging(staging: StagingRoot) {
    let display = staging.path().display().to_string();
    if let Err(e) = staging.close() {
        output::warning(&format!("Failed to remove staging root {}: {}", display, e));
    }
}
