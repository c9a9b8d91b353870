//! brew-pkg CLI
//!
//! Usage:
//!   brew-pkg [options] <formula>
//!
//! Also works as a Homebrew external command when installed as `brew-pkg` on
//! `PATH`: `brew pkg [options] <formula>`.

use anyhow::{Context, Result};
use brew_pkg::{output, CellarResolver, Cli, Config, PackageBuilder, PkgOptions, SystemRunner};

fn main() {
    if let Err(e) = run() {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_lenient();
    for warning in cli.warnings() {
        output::warning(&warning);
    }

    let opts = PkgOptions::from(cli);
    output::set_debug(opts.debug);
    let config = Config::load().context("Failed to load configuration")?;
    output::debug(&format!("{:?}", config));

    let resolver = CellarResolver::new(&config.homebrew_prefix, &config.homebrew_cellar);
    let builder = PackageBuilder::new(&config, &resolver, &SystemRunner);
    builder.build(&opts)?;
    Ok(())
}
