//! Command-line options
//!
//! `Cli` is the raw clap surface. It is converted once into an immutable
//! [`PkgOptions`], which is what the rest of the crate consumes.
//!
//! Flags clap does not know are dropped before parsing, so recognized flags
//! are honored wherever they appear and the last argument is the formula.

use clap::{Command, CommandFactory, Parser};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// `pkgbuild --ownership` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Recommended,
    Preserve,
    PreserveOther,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Recommended => "recommended",
            Ownership::Preserve => "preserve",
            Ownership::PreserveOther => "preserve-other",
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ownership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_ownership(s)
    }
}

/// Check an `--ownership` value; the error is the warning to show the user.
pub fn validate_ownership(value: &str) -> Result<Ownership, String> {
    match value {
        "recommended" => Ok(Ownership::Recommended),
        "preserve" => Ok(Ownership::Preserve),
        "preserve-other" => Ok(Ownership::PreserveOther),
        other => Err(format!(
            "{} is not a valid value for pkgbuild --ownership option, ignoring",
            other
        )),
    }
}

#[derive(Parser, Debug)]
#[command(name = "brew-pkg")]
#[command(about = "Build a macOS installer package from an installed Homebrew formula")]
#[command(
    long_about = "Build a macOS installer package from a formula. It must be already \
installed; brew-pkg doesn't handle this for you automatically. The \
'--identifier-prefix' option is strongly recommended in order to follow the \
conventions of macOS installer packages (default 'org.homebrew')."
)]
#[command(version)]
pub struct Cli {
    /// Identifier prefix prepended to the package identifier, ie. 'org.nagios'
    /// makes a package identifier called 'org.nagios.nrpe'
    #[arg(long, value_name = "PREFIX")]
    pub identifier_prefix: Option<String>,

    /// Include all the formula's dependencies in the build
    #[arg(long)]
    pub with_deps: bool,

    /// Exclude contents at <prefix>/Cellar/<formula>
    #[arg(long)]
    pub without_kegs: bool,

    /// Exclude the <prefix>/opt/<formula> link
    #[arg(long)]
    pub without_opt: bool,

    /// Folder containing custom preinstall and postinstall scripts
    #[arg(long, value_name = "DIR")]
    pub scripts: Option<PathBuf>,

    /// Custom preinstall script file
    #[arg(long, value_name = "FILE")]
    pub preinstall_script: Option<PathBuf>,

    /// Custom postinstall script file
    #[arg(long, value_name = "FILE")]
    pub postinstall_script: Option<PathBuf>,

    /// pkgbuild ownership mode: recommended, preserve or preserve-other
    #[arg(long, value_name = "MODE")]
    pub ownership: Option<String>,

    /// Install location for the package
    #[arg(long, value_name = "PATH")]
    pub install_location: Option<PathBuf>,

    /// Custom package version, overriding the formula's version
    #[arg(long, value_name = "VERSION")]
    pub pkgvers: Option<String>,

    /// Leave the staging root in place after building
    #[arg(long)]
    pub keep_staging: bool,

    /// Directory the .pkg is written to (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print extra debug information
    #[arg(long)]
    pub debug: bool,

    /// Formula to package; stray arguments before it are ignored
    #[arg(value_name = "FORMULA", required = true, num_args = 1..)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parse the process arguments, exiting with usage text on error.
    pub fn parse_lenient() -> Self {
        Self::try_parse_lenient(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse `argv` (program name first) after dropping unknown flags.
    pub fn try_parse_lenient<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        Self::try_parse_from(retain_known_args(&argv))
    }

    /// Warnings for values that are dropped when converting to [`PkgOptions`].
    pub fn warnings(&self) -> Vec<String> {
        self.ownership
            .as_deref()
            .and_then(|value| validate_ownership(value).err())
            .into_iter()
            .collect()
    }
}

/// Drop flags the CLI does not define, keeping recognized flags with their
/// values and every plain argument. The last argument is always kept.
pub fn retain_known_args(argv: &[OsString]) -> Vec<OsString> {
    let Some((program, rest)) = argv.split_first() else {
        return Vec::new();
    };

    let mut cmd = Cli::command();
    cmd.build();

    let mut kept = vec![program.clone()];
    let last = rest.len().saturating_sub(1);
    let mut i = 0;
    while i < rest.len() {
        let token = &rest[i];
        let text = token.to_string_lossy();

        if i == last || !text.starts_with('-') || text == "-" {
            kept.push(token.clone());
        } else if let Some(takes_value) = flag_takes_value(&cmd, &text) {
            kept.push(token.clone());
            // The value never swallows the formula in last position.
            if takes_value && !text.contains('=') && i + 1 < last {
                i += 1;
                kept.push(rest[i].clone());
            }
        }
        i += 1;
    }
    kept
}

/// `Some(takes_value)` for a flag `cmd` defines, `None` otherwise.
fn flag_takes_value(cmd: &Command, token: &str) -> Option<bool> {
    let arg = if let Some(long) = token.strip_prefix("--") {
        let name = long.split_once('=').map_or(long, |(name, _)| name);
        cmd.get_arguments().find(|a| a.get_long() == Some(name))
    } else {
        let short = token.strip_prefix('-')?.chars().next()?;
        cmd.get_arguments().find(|a| a.get_short() == Some(short))
    }?;
    Some(arg.get_action().takes_values())
}

/// Parsed, validated options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgOptions {
    pub formula: String,
    /// Explicit prefix from the command line; `None` falls back to config
    pub identifier_prefix: Option<String>,
    pub with_deps: bool,
    pub without_kegs: bool,
    pub without_opt: bool,
    pub scripts: Option<PathBuf>,
    pub preinstall_script: Option<PathBuf>,
    pub postinstall_script: Option<PathBuf>,
    pub ownership: Option<Ownership>,
    pub install_location: Option<PathBuf>,
    pub pkgvers: Option<String>,
    pub keep_staging: bool,
    pub output_dir: Option<PathBuf>,
    pub debug: bool,
}

impl PkgOptions {
    /// Options for packaging `formula` with everything else at its default.
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            identifier_prefix: None,
            with_deps: false,
            without_kegs: false,
            without_opt: false,
            scripts: None,
            preinstall_script: None,
            postinstall_script: None,
            ownership: None,
            install_location: None,
            pkgvers: None,
            keep_staging: false,
            output_dir: None,
            debug: false,
        }
    }

    /// The opt link is skipped by either suppression flag.
    pub fn stage_opt_link(&self) -> bool {
        !self.without_kegs && !self.without_opt
    }
}

impl From<Cli> for PkgOptions {
    fn from(cli: Cli) -> Self {
        let ownership = cli
            .ownership
            .as_deref()
            .and_then(|value| validate_ownership(value).ok());

        // clap guarantees at least one positional
        let formula = cli.args.last().cloned().unwrap_or_default();

        Self {
            formula,
            identifier_prefix: cli
                .identifier_prefix
                .map(|p| p.trim_end_matches('.').to_string()),
            with_deps: cli.with_deps,
            without_kegs: cli.without_kegs,
            without_opt: cli.without_opt,
            scripts: cli.scripts,
            preinstall_script: cli.preinstall_script,
            postinstall_script: cli.postinstall_script,
            ownership,
            install_location: cli.install_location,
            pkgvers: cli.pkgvers,
            keep_staging: cli.keep_staging,
            output_dir: cli.output_dir,
            debug: cli.debug,
        }
    }
}
