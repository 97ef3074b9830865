//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}


#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "s3cc",
        "etag",
        "f.bin",
        "-D",
        "--config",
        "/etc/s3cc.toml",
        "--log-file",
        "/tmp/s3cc.log",
    ])
    .unwrap();
    assert!(cli.debug);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/s3cc.toml")));
    assert_eq!(cli.log_file.as_deref(), Some(std::path::Path::new("/tmp/s3cc.log")));
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["s3cc", "upload", "x"]).is_err());
}
