//! Connects to the bridge's TCP telemetry stream and prints a live summary
//! of the most useful flight variables, one line per broadcast.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, BufReader};
use std::net::TcpStream;

#[derive(Parser)]
#[command(about = "Live view of the bridge telemetry stream")]
struct Args {
    /// Bridge host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Telemetry port
    #[arg(long, default_value_t = 12345)]
    port: u16,

    /// Print the raw JSON documents instead of the summary
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let stream = TcpStream::connect((args.host.as_str(), args.port))
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    eprintln!("connected to {}:{}", args.host, args.port);

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = line.context("telemetry stream closed")?;
        if args.raw {
            println!("{line}");
            continue;
        }

        let doc: serde_json::Value = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("bad document: {e}");
                continue;
            }
        };
        let vars = &doc["variables"];
        println!(
            "#{:<8} alt {:>8.1} m  ias {:>6.1} m/s  gs {:>6.1} m/s  vs {:>+6.2} m/s  hdg {:>6.3} rad  {}",
            doc["update_counter"],
            vars["Aircraft.Altitude"].as_f64().unwrap_or(0.0),
            vars["Aircraft.IndicatedAirspeed"].as_f64().unwrap_or(0.0),
            vars["Aircraft.GroundSpeed"].as_f64().unwrap_or(0.0),
            vars["Aircraft.VerticalSpeed"].as_f64().unwrap_or(0.0),
            vars["Aircraft.TrueHeading"].as_f64().unwrap_or(0.0),
            vars["Aircraft.Name"].as_str().unwrap_or("?"),
        );
    }

    Ok(())
}
