use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{error, info, warn};
use wrap_exception::{wrap, Caught};

type JsonFile = BTreeMap<String, Value>;

/// Reads a JSON object from a file and maps the outcome to a status code.
#[derive(Debug, Parser)]
struct Args {
    filepath: PathBuf,
}

fn get_json_file(filepath: PathBuf) -> Result<Option<JsonFile>> {
    if filepath.as_os_str().is_empty() {
        anyhow::bail!("filepath is required");
    }

    let data = fs::read(&filepath)
        .with_context(|| format!("failed to read {}", filepath.display()))?;
    if data.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&data)?))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let get_json_file = wrap(get_json_file);

    let res = match get_json_file.call((args.filepath,)).into_ready() {
        Ok(res) => res,
        Err(_) => anyhow::bail!("get_json_file is synchronous"),
    };

    let status = match res.into_result() {
        Err(Caught::Raised(err)) if err.is::<serde_json::Error>() => {
            error!("malformed json file: {:?}", err);
            422
        }
        Err(Caught::Raised(err)) => {
            warn!("user input error: {:?}", err);
            400
        }
        Err(Caught::Panicked(panic)) => {
            error!("internal error: {}", panic);
            500
        }
        Ok(None) => 404,
        Ok(Some(data)) => {
            info!("successfully got the file: {:?}", data);
            200
        }
    };

    info!("status: {}", status);

    Ok(())
}
