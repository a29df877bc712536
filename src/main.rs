//! scriv - A static site generator for markdown blogs.

mod cli;
mod compiler;
mod config;
mod data;
mod error;
mod logger;
mod matcher;
mod render;
mod serve;
mod utils;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use compiler::Dispatcher;
use config::SiteConfig;
use serve::serve_site;
use watch::WatchLoop;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match cli.command {
        Commands::Compile { watch } => {
            let dispatcher = compile_site(config)?;
            if watch {
                WatchLoop::new(dispatcher).run()?;
            }
            Ok(())
        }
        Commands::Serve { .. } => {
            let serve_config = config.clone();
            let dispatcher = compile_site(config)?;
            let watch = serve_config.serve.watch.then(|| WatchLoop::new(dispatcher));
            serve_site(&serve_config, watch)
        }
    }
}

/// Build every registered compiler's sources into `build.dest`.
fn compile_site(config: SiteConfig) -> Result<Dispatcher> {
    let mut dispatcher =
        Dispatcher::with_default_compilers(config).context("Failed to set up compilers")?;
    dispatcher.compile_all().context("Failed to compile site")?;
    log!("compile"; "done: {}", dispatcher.compiler_names().join(", "));
    Ok(dispatcher)
}
