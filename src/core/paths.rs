use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base tokenswap config directory (universal ~/.config/tokenswap/ on all platforms)
pub fn tokenswap() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("tokenswap"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("tokenswap"))
    }
}

/// Global tokenswap.json config file path
pub fn tokenswap_json() -> Result<PathBuf> {
    Ok(tokenswap()?.join("tokenswap.json"))
}
