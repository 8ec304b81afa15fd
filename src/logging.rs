// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Install the process-wide tracing subscriber for the CLI
// role: ambient/logging
// inputs: RUST_LOG, --verbose flag
// outputs: Formatted log lines on stderr
// side_effects: Sets the global tracing subscriber (first call wins)
// invariants: stdout stays free of log output; RUST_LOG overrides the verbosity default
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing_subscriber::{EnvFilter, fmt};

pub fn default_directive(verbose: bool) -> &'static str {
  if verbose { "debug" } else { "info" }
}

pub fn init(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
  let _ = fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}
