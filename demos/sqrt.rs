use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use wrap_exception::wrap;

/// Square root that falls back to zero on invalid input.
#[derive(Debug, Parser)]
struct Args {
    #[clap(allow_negative_numbers = true)]
    number: f64,
}

fn sqrt(number: f64) -> Result<f64> {
    let result = number.sqrt();
    if result.is_nan() {
        anyhow::bail!("number is invalid");
    }

    Ok(result)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let sqrt = wrap(sqrt);

    let res = match sqrt.call((args.number,)).into_ready() {
        Ok(res) => res,
        Err(_) => anyhow::bail!("sqrt is synchronous"),
    };

    let value = match res.into_result() {
        Ok(value) => value,
        Err(err) => {
            warn!("invalid input: {}", err);
            0.0
        }
    };

    info!("sqrt({}) = {}", args.number, value);

    Ok(())
}
