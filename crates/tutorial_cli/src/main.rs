//! Command-line probe for the tutorial store.
//!
//! Opens the store described by `TUTORIAL_*` environment variables and
//! prints catalog counts. Exits non-zero on configuration or storage errors.

use std::process::ExitCode;
use tutorial_core::{
    core_version, init_logging_from_config, open_store_summary, StoreConfig,
};

fn main() -> ExitCode {
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("tutorial_cli: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("tutorial_cli: logging disabled: {err}");
    }

    println!("tutorial_core version={}", core_version());
    match open_store_summary(&config) {
        Ok(summary) => {
            println!("tutorials total={}", summary.total);
            println!("tutorials published={}", summary.published);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_summary module=cli status=error error={err}");
            eprintln!("tutorial_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
