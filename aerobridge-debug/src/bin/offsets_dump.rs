//! Prints the shared-memory layout the way the sidecar describes it, either
//! from a written `AeroflyBridge_offsets.json` or straight from the registry
//! built into this binary.

use aerobridge_core::shm::sidecar;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Dump the shared-memory offsets table")]
struct Args {
    /// Read this sidecar file instead of the built-in registry
    #[arg(long)]
    file: Option<PathBuf>,

    /// Emit the full JSON document instead of the table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let doc: serde_json::Value = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("sidecar is not valid JSON")?
        }
        None => serde_json::to_value(sidecar::offsets_document())?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!(
        "layout_version {}  array_base {}  stride {}  count {}",
        doc["layout_version"], doc["array_base_offset"], doc["stride_bytes"], doc["count"]
    );
    println!("{:<40} {:>6} {:>8} {:>6}  {}", "name", "index", "offset", "len", "storage");
    for var in doc["variables"].as_array().context("missing variables")? {
        println!(
            "{:<40} {:>6} {:>8} {:>6}  {}",
            var["name"].as_str().unwrap_or("?"),
            var["logical_index"],
            var["byte_offset"],
            var["byte_length"],
            var["storage"].as_str().unwrap_or("?"),
        );
    }

    Ok(())
}
