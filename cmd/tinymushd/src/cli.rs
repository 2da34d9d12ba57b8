//! Command-line surface (spec.md §6 "CLI surface of the bundled tool").

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "tinymushd", author, version, about = "TinyMUSH-style core server")]
pub struct Cli {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Clone)]
pub struct Options {
    #[arg(short = 'f', long = "config", value_name = "CONFIG_FILE", help = "Path to the TOML config file", default_value = "tinymush.toml")]
    pub config: PathBuf,

    #[arg(short = 'd', long = "datadir", value_name = "DATA_DIR", help = "Directory for logs and runtime state")]
    pub datadir: Option<PathBuf>,

    #[arg(short = 'D', long = "dbdir", value_name = "DB_DIR", help = "Directory containing the flat-file database dump")]
    pub dbdir: Option<PathBuf>,

    #[arg(long = "log-level", value_enum, default_value = "info", help = "Verbosity of the tracing subscriber")]
    pub log_level: LogLevel,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converts between the flat-file dump format and the native store
    /// (spec.md §6 `dbconvert`).
    Dbconvert(DbconvertArgs),
}

#[derive(Parser, Debug)]
pub struct DbconvertArgs {
    #[arg(short = 'f', value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
    #[arg(short = 'd', value_name = "DATA_DIR")]
    pub datadir: Option<PathBuf>,
    #[arg(short = 'D', value_name = "DB_DIR")]
    pub dbdir: Option<PathBuf>,

    /// `-C`: check the dump for structural validity without writing output.
    #[arg(short = 'C', action = ArgAction::SetTrue)]
    pub check: bool,
    /// `-g`: emit flat-file (text dump) output.
    #[arg(short = 'g', action = ArgAction::SetTrue)]
    pub flat_output: bool,
    /// `-G`: emit native (in-memory snapshot) output.
    #[arg(short = 'G', action = ArgAction::SetTrue)]
    pub native_output: bool,
    /// `-W`: write output to `--dbdir`.
    #[arg(short = 'W', action = ArgAction::SetTrue)]
    pub write: bool,
    /// `-w`: skip writing output (dry run).
    #[arg(short = 'w', action = ArgAction::SetTrue)]
    pub skip_write: bool,
    /// `-X`: produce a minimized database (drop garbage slots).
    #[arg(short = 'X', action = ArgAction::SetTrue)]
    pub min_db: bool,
    /// `-x`: produce a minimized flat-file (drop comments/whitespace).
    #[arg(short = 'x', action = ArgAction::SetTrue)]
    pub min_flat: bool,

    /// `-K`/`-k`: include/exclude attribute-owner bytes.
    #[arg(short = 'K', action = ArgAction::SetTrue)]
    pub keep_attr_owners: bool,
    #[arg(short = 'k', action = ArgAction::SetTrue)]
    pub drop_attr_owners: bool,

    /// `-N`/`-H`: include/exclude player names.
    #[arg(short = 'N', action = ArgAction::SetTrue)]
    pub keep_names: bool,
    #[arg(short = 'H', action = ArgAction::SetTrue)]
    pub drop_names: bool,

    /// `-L`/`-l`: include/exclude lock strings.
    #[arg(short = 'L', action = ArgAction::SetTrue)]
    pub keep_locks: bool,
    #[arg(short = 'l', action = ArgAction::SetTrue)]
    pub drop_locks: bool,

    /// `-M`/`-m`: include/exclude mail-system attributes.
    #[arg(short = 'M', action = ArgAction::SetTrue)]
    pub keep_mail: bool,
    #[arg(short = 'm', action = ArgAction::SetTrue)]
    pub drop_mail: bool,

    /// `-P`/`-p`: include/exclude password hashes.
    #[arg(short = 'P', action = ArgAction::SetTrue)]
    pub keep_passwords: bool,
    #[arg(short = 'p', action = ArgAction::SetTrue)]
    pub drop_passwords: bool,

    /// `-Z`/`-z`: include/exclude zone links.
    #[arg(short = 'Z', action = ArgAction::SetTrue)]
    pub keep_zones: bool,
    #[arg(short = 'z', action = ArgAction::SetTrue)]
    pub drop_zones: bool,

    /// Path to the input dump read from (flat-file source for the conversion).
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Path the converted output is written to when `-W` is given.
    #[arg(value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,
}

/// Which record classes a `dbconvert` pass keeps, derived from the `-K/-k`
/// style pairs (spec.md §6); the *exclude* flag wins when both are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbconvertFeatures {
    pub attr_owners: bool,
    pub names: bool,
    pub locks: bool,
    pub mail: bool,
    pub passwords: bool,
    pub zones: bool,
}

impl From<&DbconvertArgs> for DbconvertFeatures {
    fn from(args: &DbconvertArgs) -> Self {
        DbconvertFeatures {
            attr_owners: !args.drop_attr_owners,
            names: !args.drop_names,
            locks: !args.drop_locks,
            mail: !args.drop_mail,
            passwords: !args.drop_passwords,
            zones: !args.drop_zones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exclude_flag_overrides_default_inclusion() {
        let args = DbconvertArgs {
            config: None,
            datadir: None,
            dbdir: None,
            check: false,
            flat_output: true,
            native_output: false,
            write: false,
            skip_write: true,
            min_db: false,
            min_flat: false,
            keep_attr_owners: false,
            drop_attr_owners: true,
            keep_names: false,
            drop_names: false,
            keep_locks: false,
            drop_locks: false,
            keep_mail: false,
            drop_mail: false,
            keep_passwords: false,
            drop_passwords: true,
            keep_zones: false,
            drop_zones: false,
            input: PathBuf::from("in.db"),
            output: None,
        };
        let features = DbconvertFeatures::from(&args);
        assert!(!features.attr_owners);
        assert!(!features.passwords);
        assert!(features.names);
    }
}
