use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::cli::Cli;

/// Environment fallback for lookup paths, in `PATH`-style list form.
pub const ENTITY_PATH_ENV: &str = "ENTITY_PATH";

pub fn resolve_entity_paths(cli: &Cli) -> Vec<PathBuf> {
    entity_paths_from(&cli.path, env::var_os(ENTITY_PATH_ENV))
}

/// `--path` flags win over the environment. No configured paths at all is
/// legal here; discovery reports the missing configuration when it runs.
pub fn entity_paths_from(cli_paths: &[PathBuf], env_value: Option<OsString>) -> Vec<PathBuf> {
    if !cli_paths.is_empty() {
        return cli_paths.to_vec();
    }
    match env_value {
        Some(value) => env::split_paths(&value).collect(),
        None => Vec::new(),
    }
}
