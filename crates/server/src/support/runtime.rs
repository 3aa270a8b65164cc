#![forbid(unsafe_code)]

use super::ServerError;
use std::path::PathBuf;

pub(crate) const STORAGE_DIR_ENV: &str = "TJ_STORAGE_DIR";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RuntimeArgs {
    pub(crate) storage_dir: PathBuf,
    pub(crate) config_path: Option<PathBuf>,
}

impl RuntimeArgs {
    /// `--storage-dir` wins over `TJ_STORAGE_DIR`; one of them is required.
    pub(crate) fn parse(
        args: impl IntoIterator<Item = String>,
        env_storage_dir: Option<PathBuf>,
    ) -> Result<Self, ServerError> {
        let mut args = args.into_iter();
        let mut storage_dir: Option<PathBuf> = None;
        let mut config_path: Option<PathBuf> = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--storage-dir" => storage_dir = Some(flag_value(&mut args, "--storage-dir")?),
                "--config" => config_path = Some(flag_value(&mut args, "--config")?),
                other => return Err(ServerError::Usage(format!("unknown argument: {other}"))),
            }
        }

        let storage_dir = storage_dir
            .or_else(|| env_storage_dir.filter(|dir| !dir.as_os_str().is_empty()))
            .ok_or_else(|| {
                ServerError::Usage(format!("--storage-dir (or {STORAGE_DIR_ENV}) is required"))
            })?;
        Ok(Self {
            storage_dir,
            config_path,
        })
    }
}

fn flag_value(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<PathBuf, ServerError> {
    match args.next() {
        Some(value) if !value.trim().is_empty() && !value.starts_with("--") => {
            Ok(PathBuf::from(value))
        }
        _ => Err(ServerError::Usage(format!("{flag} expects a path"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn flag_wins_over_env() {
        let parsed = RuntimeArgs::parse(
            args(&["--storage-dir", "/tmp/a", "--config", "game.yaml"]),
            Some(PathBuf::from("/tmp/env")),
        )
        .expect("parse");
        assert_eq!(parsed.storage_dir, PathBuf::from("/tmp/a"));
        assert_eq!(parsed.config_path, Some(PathBuf::from("game.yaml")));
    }

    #[test]
    fn env_is_the_fallback() {
        let parsed =
            RuntimeArgs::parse(Vec::new(), Some(PathBuf::from("/tmp/env"))).expect("parse");
        assert_eq!(parsed.storage_dir, PathBuf::from("/tmp/env"));
        assert_eq!(parsed.config_path, None);
    }

    #[test]
    fn missing_or_malformed_flags_are_usage_errors() {
        assert!(matches!(
            RuntimeArgs::parse(Vec::new(), None),
            Err(ServerError::Usage(_))
        ));
        assert!(matches!(
            RuntimeArgs::parse(args(&["--storage-dir"]), None),
            Err(ServerError::Usage(_))
        ));
        assert!(matches!(
            RuntimeArgs::parse(args(&["--storage-dir", "/tmp/a", "--verbose"]), None),
            Err(ServerError::Usage(_))
        ));
    }
}
