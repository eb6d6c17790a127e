//! `people [preset | manifest.json] [--assets DIR]`
//!
//! Opens the viewer with a built-in preset (default `people`) or a JSON
//! manifest. `--assets` overrides the directory model paths resolve against.

use std::path::PathBuf;
use std::process::ExitCode;

use people::config::PRESETS;
use people::{App, ViewerConfig};

struct Args {
    source: String,
    assets: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut source = None;
    let mut assets = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assets" => {
                let dir = args.next().ok_or("--assets needs a directory")?;
                assets = Some(PathBuf::from(dir));
            }
            "-h" | "--help" => {
                return Err(format!(
                    "usage: people [preset | manifest.json] [--assets DIR]\npresets: {}",
                    PRESETS.join(", ")
                ));
            }
            _ if source.is_none() => source = Some(arg),
            _ => return Err(format!("unexpected argument '{arg}'")),
        }
    }

    Ok(Args {
        source: source.unwrap_or_else(|| "people".to_string()),
        assets,
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = match ViewerConfig::from_arg(&args.source) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = args.assets {
        config.asset_root = dir;
    }

    log::info!("Starting '{}' with assets from {}", args.source, config.asset_root.display());

    match App::new(config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
