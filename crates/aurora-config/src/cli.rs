//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Aurora pipeline command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "aurora", about = "Aurora environment-effects pipeline")]
pub struct CliArgs {
    /// Camera target width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Camera target height.
    #[arg(long)]
    pub height: Option<u32>,

    /// MSAA sample count for the camera target.
    #[arg(long)]
    pub msaa: Option<u32>,

    /// Path to a RON effect profile.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to run before exiting.
    #[arg(long)]
    pub frames: Option<u32>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if let Some(samples) = args.msaa {
            self.render.msaa_samples = samples;
        }
        if let Some(ref profile) = args.profile {
            self.environment.profile = Some(profile.clone());
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> CliArgs {
        CliArgs {
            width: None,
            height: None,
            msaa: None,
            profile: None,
            log_level: None,
            config: None,
            frames: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            msaa: Some(1),
            log_level: Some("trace".to_string()),
            ..no_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.render.width, 1920);
        assert_eq!(config.render.msaa_samples, 1);
        assert_eq!(config.debug.log_level, "trace");
        // Non-overridden fields retain defaults.
        assert_eq!(config.render.height, 720);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&no_args());
        assert_eq!(config, original);
    }
}
