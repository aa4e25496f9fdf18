//! Semantic UI LESS to Sass converter binary

use less2sass::EnhancedCli;
use std::process;

fn main() {
    let mut cli = EnhancedCli::new();

    if let Err(e) = cli.run() {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}
