//! Build macOS installer packages from installed Homebrew formulae
//!
//! Given the name of an installed formula, brew-pkg stages its keg into a
//! temporary root that mirrors the Homebrew prefix, optionally folds in its
//! dependencies and installer scripts, and hands the result to `pkgbuild`.
//!
//! # Example
//!
//! ```text
//! brew-pkg --identifier-prefix org.nagios --with-deps nrpe
//! ```
//!
//! produces `nrpe-<version>.pkg` with identifier `org.nagios.nrpe`.
//!
//! # Pipeline
//!
//! 1. [`options`] - parse flags into an immutable [`PkgOptions`]
//! 2. [`formula`] - resolve the formula through a [`FormulaResolver`]
//! 3. [`staging`] - copy kegs, `opt/` links and launchd plists into a
//!    [`StagingRoot`]
//! 4. [`scripts`] - collect `preinstall` / `postinstall`
//! 5. [`pkgbuild`] - invoke `pkgbuild` through a [`CommandRunner`]
//!
//! [`PackageBuilder`] drives the steps in order.

pub mod builder;
pub mod config;
pub mod error;
pub mod formula;
pub mod fs_utils;
pub mod options;
pub mod output;
pub mod pkgbuild;
pub mod scripts;
pub mod staging;

pub use builder::{BuildOutcome, PackageBuilder};
pub use config::Config;
pub use error::PkgError;
pub use formula::{CellarResolver, FormulaRecord, FormulaResolver, ServiceDefinition};
pub use options::{Cli, Ownership, PkgOptions};
pub use pkgbuild::{CommandRunner, PkgbuildArgs, SystemRunner};
pub use staging::StagingRoot;
