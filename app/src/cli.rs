//! Command-line interface.

use cinder_core::PlatformKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Archive and clean up social media accounts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run (or resume) the automation for an account
    Run(RunArgs),
    /// Show saved runner state and job statuses
    Status {
        /// Account to inspect; all accounts when omitted
        #[arg(long)]
        account: Option<String>,
    },
    /// Forget an account's saved runner state
    Reset {
        /// Account whose saved state is cleared
        #[arg(long)]
        account: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, value_enum)]
    pub platform: PlatformArg,
    #[arg(long)]
    pub account: String,
    /// Delete everything the platform can delete
    #[arg(long)]
    pub delete: bool,
    /// Archive before deleting
    #[arg(long)]
    pub archive: bool,
    /// Walk the run against a scripted page instead of a browser
    #[arg(long)]
    pub dry_run: bool,
    /// Directory for built archives; defaults to `<data dir>/archives`
    #[arg(long, env = "CINDER_ARCHIVE_DIR")]
    pub archive_dir: Option<std::path::PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    X,
    Facebook,
}

impl From<PlatformArg> for PlatformKind {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::X => Self::X,
            PlatformArg::Facebook => Self::Facebook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "cinder", "run", "--platform", "x", "--account", "a1", "--delete", "--dry-run",
        ])
        .expect("parse");
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.platform, PlatformArg::X);
        assert_eq!(args.account, "a1");
        assert!(args.delete && args.dry_run && !args.archive);
    }

    #[test]
    fn test_platform_is_required() {
        assert!(Cli::try_parse_from(["cinder", "run", "--account", "a1"]).is_err());
    }

    #[test]
    fn test_status_account_is_optional() {
        let cli = Cli::try_parse_from(["cinder", "status"]).expect("parse");
        assert!(matches!(cli.command, Commands::Status { account: None }));
    }
}
