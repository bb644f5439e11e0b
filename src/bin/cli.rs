use core::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use unitpath::{ConversionTable, Dimensions, Error, default_table, parse_expression};

/// Convert or simplify units, values and expressions. All expressions
/// should be provided in quotes.
#[derive(Parser, Debug)]
#[command(name = "unitpath", version, about)]
struct Cli {
    /// The expression you want to simplify or convert
    expr: String,

    /// The unit you want the result to be converted to; when absent, the
    /// expression is simplified instead
    #[arg(short, long)]
    to: Option<String>,

    /// Conversion-fact file; the built-in table is used when absent
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Fail on malformed fact lines instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Print timing info for debugging purposes
    #[arg(short = 'D', long)]
    debug: bool,
}

/// A path-relevant symbol that appears on no side of any declared edge.
#[derive(Debug)]
struct UnknownSymbol(String);

impl fmt::Display for UnknownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown symbol `{}`", self.0)
    }
}

impl std::error::Error for UnknownSymbol {}

/// First symbol of `dims` the table has never seen on either side of an
/// edge. Symbols inside compound sides (the `J` of `W -> J/s`) count as
/// known.
fn first_unknown_symbol(table: &ConversionTable, dims: &Dimensions) -> Option<String> {
    let edges = table.matching(None, None);
    dims.iter()
        .find(|(sym, _)| {
            !edges.iter().any(|edge| {
                edge.from().dims().exponent(sym) != 0 || edge.to().dims().exponent(sym) != 0
            })
        })
        .map(|(sym, _)| sym.to_string())
}

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let code = if err.downcast_ref::<UnknownSymbol>().is_some() {
                2
            } else {
                match err.downcast_ref::<Error>() {
                    Some(Error::Parse { .. }) => 2,
                    Some(Error::NoPath { .. }) => 3,
                    _ => 1,
                }
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let start = Instant::now();

    let loaded;
    let table = match &cli.data {
        Some(path) => {
            loaded = if cli.strict {
                ConversionTable::load_strict(path)?
            } else {
                ConversionTable::load(path)?
            };
            for reject in loaded.rejects() {
                eprintln!("warning: {reject}");
            }
            &loaded
        }
        None => default_table(),
    };
    if cli.debug {
        eprintln!("loaded conversions: {:?}", start.elapsed());
    }

    let from = parse_expression(&cli.expr)?;
    if cli.debug {
        eprintln!("parsed source: {:?}", start.elapsed());
    }

    let result = match &cli.to {
        Some(target) => {
            let to = parse_expression(target)?;
            if cli.debug {
                eprintln!("parsed target: {:?}", start.elapsed());
            }
            match table.convert(&from, &to) {
                Ok(out) => out,
                Err(err @ Error::NoPath { .. }) => {
                    // A symbol the table has never seen explains the miss
                    // better than a plain no-path report.
                    let unknown = first_unknown_symbol(table, from.dims())
                        .or_else(|| first_unknown_symbol(table, to.dims()));
                    return Err(match unknown {
                        Some(sym) => UnknownSymbol(sym).into(),
                        None => err.into(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        None => {
            let simplified = table.simplify(&from);
            if cli.debug {
                eprintln!("simplified source: {:?}", start.elapsed());
            }
            simplified
        }
    };
    if cli.debug {
        eprintln!("converted: {:?}", start.elapsed());
    }

    println!("{result}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_symbols_checked_against_both_edge_sides() {
        let table = ConversionTable::from_facts("m cm 100\nW J/s 1");

        let q = parse_expression("florp J/m").unwrap();
        assert_eq!(
            first_unknown_symbol(&table, q.dims()),
            Some("florp".to_string())
        );

        // J only ever appears inside a compound side; still known.
        let known = parse_expression("J/m").unwrap();
        assert_eq!(first_unknown_symbol(&table, known.dims()), None);
    }
}
