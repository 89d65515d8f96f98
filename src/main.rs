//! Kryon Layout Binary

use kryon_layout::cli::KrylCli;
use std::process;

fn main() {
    let mut cli = KrylCli::new();
    if let Err(e) = cli.run() {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}
