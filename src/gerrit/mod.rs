// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Namespace for review-server access (API seam, typed records, paginated fetch)
// role: gerrit/namespace
// outputs: Public submodules api, fetch, model
// invariants: Network access stays behind the GerritApi trait
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod api;
pub mod fetch;
pub mod model;
