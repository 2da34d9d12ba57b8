mod cli;
mod config;
mod dbconvert;
mod server;
mod tracing_init;

use clap::Parser;

use cli::{Cli, Command};
use config::TomlConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Dbconvert(args)) => {
            let _guard = tracing_init::init_tracing(cli.opts.log_level.into(), None);
            dbconvert::run(args)
        }
        None => {
            let mut config = TomlConfig::load(&cli.opts.config)?;
            if let Some(datadir) = &cli.opts.datadir {
                config.datadir = datadir.clone();
            }
            if let Some(dbdir) = &cli.opts.dbdir {
                config.dbdir = dbdir.clone();
            }
            let _guard = tracing_init::init_tracing(cli.opts.log_level.into(), Some(&config.datadir));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::run(config))
        }
    }
}
