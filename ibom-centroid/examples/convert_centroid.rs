//! Convert a centroid file and print its bill of materials.

use ibom_centroid::prelude::*;
use std::path::Path;

fn main() -> Result<(), CentroidError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/simple_board.xy".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example convert_centroid [path/to/board.xy]");
        std::process::exit(1);
    }

    let options = ConversionOptions::new(50.0, 40.0, 0.1);
    let result = CentroidCore::convert_file(path, &options)?;

    println!("BOM for: {}", result.source);
    println!(
        "Components: {} ({} top, {} bottom)",
        result.stats.components, result.stats.top, result.stats.bottom
    );
    println!();

    for group in &result.pcbdata.bom.both {
        let refs: Vec<&str> = group.references().collect();
        println!(
            "  {:>3} x {:<12} {:<24} {}",
            group.quantity,
            group.value,
            group.footprint,
            refs.join(", ")
        );
    }

    Ok(())
}
