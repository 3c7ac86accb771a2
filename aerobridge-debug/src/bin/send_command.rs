//! Sends one command to the bridge's TCP command port, the same way a shell
//! script would: connect, write one JSON object, close.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::net::TcpStream;

#[derive(Parser)]
#[command(about = "Send a single variable command to the bridge")]
struct Args {
    /// Dotted variable name, e.g. Controls.Throttle
    variable: String,

    /// Numeric value to set
    value: f64,

    /// Bridge host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Command port
    #[arg(long, default_value_t = 12346)]
    port: u16,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = serde_json::json!({
        "variable": args.variable,
        "value": args.value,
    });

    let mut stream = TcpStream::connect((args.host.as_str(), args.port))
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    stream
        .write_all(command.to_string().as_bytes())
        .context("failed to send command")?;

    println!("sent {command}");
    Ok(())
}
