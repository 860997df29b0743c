//! Configuration (§10.3): the settings that cross the Engine boundary.
//! File-based config loading is out of scope (§1); only the flag/env/default
//! cascade is implemented, matching the teacher's own `main.rs`.

use std::path::PathBuf;

/// Engine-facing configuration: where the DocStore and search indexes live,
/// and the address the RPC facade listens on.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub rpc_endpoint: String,
}

impl Config {
    /// Resolve the data directory with the teacher's override precedence:
    /// explicit flag > `RISP_DATA_DIR` env var > platform data dir > a local
    /// fallback.
    pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = flag {
            return dir;
        }
        if let Ok(env_dir) = std::env::var("RISP_DATA_DIR") {
            return PathBuf::from(env_dir);
        }
        if let Some(base) = dirs::data_dir() {
            return base.join("risp");
        }
        PathBuf::from(".").join(".risp-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flag_wins_over_everything() {
        let resolved = Config::resolve_data_dir(Some(PathBuf::from("/explicit")));
        assert_eq!(resolved, PathBuf::from("/explicit"));
    }
}
