//! Main binary entry point for the `smellfix` tool.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so that `smellfix-bin` and the `smellfix-cli` crate behave identically.

use anyhow::Result;

fn main() -> Result<()> {
    let code = smellfix::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
