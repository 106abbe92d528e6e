//! `micac` — the mica compiler binary.
//!
//! A thin wrapper around [`mica_cli::run_cli`]; all command logic lives
//! in the library crate for testability.

fn main() {
    env_logger::init();
    std::process::exit(mica_cli::run_cli());
}
