use std::path::PathBuf;

use crate::config::{Config, SourceKind};

/// Options parsed from command line arguments
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub watch_snapshot: bool,
    pub normalize_plates: bool,
    pub snapshot: Option<PathBuf>,
    pub location: Option<String>,
}

impl CliOptions {
    /// Parse command line arguments
    /// Format: recon-mcp [options]
    /// Options:
    ///   --snapshot <path>   Read rows from a JSON export instead of the RPC endpoint
    ///   --location <id>     Default location when a request names none
    ///   --normalize-plates  Ignore case, spaces and hyphens when deduplicating
    ///   -w                  Refresh the comparison when the snapshot changes
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    /// Parse from a given argument list
    pub fn parse(args: &[String]) -> Self {
        let mut opts = Self::default();
        let mut iter = args.iter().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-w" => opts.watch_snapshot = true,
                "--normalize-plates" => opts.normalize_plates = true,
                "--snapshot" => match iter.next() {
                    Some(path) => opts.snapshot = Some(PathBuf::from(path)),
                    None => tracing::warn!("--snapshot requires a path"),
                },
                "--location" => match iter.next() {
                    Some(id) => opts.location = Some(id.clone()),
                    None => tracing::warn!("--location requires an id"),
                },
                other => tracing::warn!("Ignoring unknown argument: {other}"),
            }
        }

        tracing::info!(
            "Parsed CLI options: snapshot={:?}, location={:?}, normalize_plates={}, watch={}",
            opts.snapshot,
            opts.location,
            opts.normalize_plates,
            opts.watch_snapshot
        );

        opts
    }

    /// Layer these options over environment configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.snapshot {
            config.source.kind = SourceKind::Snapshot;
            config.source.snapshot_path = Some(path.clone());
        }
        if self.normalize_plates {
            config.reconcile.normalize_plates = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_options() {
        let opts = CliOptions::parse(&args(&["recon-mcp"]));
        assert!(!opts.watch_snapshot);
        assert!(opts.snapshot.is_none());
        assert!(opts.location.is_none());
    }

    #[test]
    fn test_parse_with_options() {
        let opts = CliOptions::parse(&args(&[
            "recon-mcp",
            "-w",
            "--snapshot",
            "rows.json",
            "--location",
            "loc-7",
            "--normalize-plates",
        ]));
        assert!(opts.watch_snapshot);
        assert!(opts.normalize_plates);
        assert_eq!(opts.snapshot, Some(PathBuf::from("rows.json")));
        assert_eq!(opts.location.as_deref(), Some("loc-7"));
    }

    #[test]
    fn test_parse_missing_value() {
        let opts = CliOptions::parse(&args(&["recon-mcp", "--snapshot"]));
        assert!(opts.snapshot.is_none());
    }

    #[test]
    fn test_apply_snapshot_overrides_source() {
        let opts = CliOptions::parse(&args(&["recon-mcp", "--snapshot", "rows.json"]));
        let mut config = Config::default();
        opts.apply(&mut config);

        assert_eq!(config.source.kind, SourceKind::Snapshot);
        assert!(config.validate().is_ok());
    }
}
