//! Runs a query against a Bayesian network file.
//!
//! The four canned queries on the dog-howling network:
//!
//! - `a`: P(FH)
//! - `b`: P(FS | FM, FH)
//! - `c`: P(FS | FM, FH, FB)
//! - `d`: P(FS | FH, FM, FB, NA)
//!
//! Run with:
//! ```bash
//! cargo run --example query -- tests/data/fido.json b --verbose
//! cargo run --example query -- tests/data/fido.json --query FS --evidence FH=true --evidence FB=false
//! ```

use clap::Parser;
use color_eyre::eyre::{bail, eyre};

use varelim_rs::evidence::Evidence;
use varelim_rs::network::Network;
use varelim_rs::value::Value;

#[derive(Debug, Parser)]
#[command(author, version, about = "Exact inference by variable elimination")]
struct Cli {
    /// Network file (JSON).
    #[arg(value_name = "FILE")]
    network: std::path::PathBuf,

    /// Canned query: a, b, c or d.
    #[arg(value_name = "QUERY")]
    canned: Option<String>,

    /// Query variable (repeatable), instead of a canned query.
    #[arg(long = "query", value_name = "VAR")]
    query: Vec<String>,

    /// Observation `VAR=VALUE` (repeatable).
    #[arg(long = "evidence", value_name = "VAR=VALUE", value_parser = parse_observation)]
    evidence: Vec<(String, Value)>,

    /// Log every factor operation, with operand and result tables.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_observation(s: &str) -> Result<(String, Value), String> {
    let (var, value) = s.split_once('=').ok_or_else(|| format!("expected VAR=VALUE, got '{}'", s))?;
    Ok((var.to_string(), value.parse()?))
}

fn canned(name: &str) -> color_eyre::Result<(Vec<String>, Evidence)> {
    let (query, observed): (&str, &[&str]) = match name {
        "a" => ("FH", &[]),
        "b" => ("FS", &["FM", "FH"]),
        "c" => ("FS", &["FM", "FH", "FB"]),
        "d" => ("FS", &["FH", "FM", "FB", "NA"]),
        other => bail!("unknown query '{}', expected one of a, b, c, d", other),
    };
    Ok((vec![query.to_string()], observed.iter().map(|&v| (v, true)).collect()))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Trace
        } else {
            simplelog::LevelFilter::Warn
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let net = Network::load(&args.network)?;
    println!("variables = {:?}", net.variables());

    let (query, evidence) = match &args.canned {
        Some(name) => canned(name)?,
        None if !args.query.is_empty() => (args.query.clone(), args.evidence.iter().cloned().collect()),
        None => return Err(eyre!("give a canned query (a, b, c, d) or --query VAR")),
    };

    let time_total = std::time::Instant::now();
    let posterior = net.query(&query, &evidence)?;
    let time_total = time_total.elapsed();

    let observed: Vec<String> = evidence.iter().map(|(var, value)| format!("{}={}", var, value)).collect();
    if observed.is_empty() {
        println!("P({}) =", query.join(", "));
    } else {
        println!("P({} | {}) =", query.join(", "), observed.join(", "));
    }
    print!("{}", posterior);
    println!("Done in {:.3} ms", time_total.as_secs_f64() * 1000.0);

    Ok(())
}
