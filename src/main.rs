use anyhow::Result;
use clap::Parser;

mod classify;
mod cli;
mod export;
mod ext;
mod gerrit;
mod gitio;
mod logging;
mod manifest;
mod pipeline;
mod range_commits;
mod snapshot;
mod util;

use crate::cli::{Cli, normalize};

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  logging::init(cli.verbose);

  // Phase 1: validate flags; nothing touches disk or network before this succeeds
  let cfg = normalize(cli)?;

  // Phase 2: run the task and point at what was written
  for outcome in pipeline::run(&cfg)? {
    println!("{}", outcome.path.display());
  }
  Ok(())
}
