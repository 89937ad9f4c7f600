use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::config::SyncConfig;

/// Watch a screen's synchronized state from the command line
#[derive(Parser, Debug)]
#[command(name = "wallet-sync")]
#[command(about = "Watch a wallet or admin screen's synchronized state", long_about = None)]
pub struct CliArgs {
    /// Base URL of the wallet/fraud-review backend
    #[arg(
        long = "api-url",
        value_name = "URL",
        default_value = "http://localhost:8000",
        help = "Base URL of the backend"
    )]
    pub api_url: String,

    /// Bearer credential identifying the session
    #[arg(long = "token", value_name = "TOKEN", help = "Bearer token to bind")]
    pub token: String,

    /// Which screen to drive
    #[arg(
        long = "screen",
        value_name = "SCREEN",
        default_value = "wallet",
        help = "Screen to drive: 'wallet' or 'admin'"
    )]
    pub screen: ScreenType,

    /// How long to keep the screen active before tearing down
    #[arg(
        long = "watch-secs",
        value_name = "SECS",
        default_value_t = 60,
        help = "Seconds to watch before deactivating (default: 60)"
    )]
    pub watch_secs: u64,

    /// Delay before the poll loop is scheduled (overrides the default)
    #[arg(
        long = "startup-delay-ms",
        value_name = "MS",
        help = "Delay after initial load before polling starts (default: 5000)"
    )]
    pub startup_delay_ms: Option<u64>,

    /// Poll period (overrides the default)
    #[arg(
        long = "poll-period-ms",
        value_name = "MS",
        help = "Interval between background refreshes (default: 15000)"
    )]
    pub poll_period_ms: Option<u64>,

    /// Per-request deadline (overrides the default)
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        help = "Deadline for each remote call (default: 30000)"
    )]
    pub timeout_ms: Option<u64>,
}

/// Screens the harness can drive
#[derive(Clone, Debug, ValueEnum)]
pub enum ScreenType {
    Wallet,
    Admin,
}

impl CliArgs {
    /// Create a SyncConfig from CLI arguments
    ///
    /// Uses the provided timing overrides where given, the defaults
    /// otherwise; zero values fall back with a warning.
    pub fn to_sync_config(&self) -> SyncConfig {
        let default = SyncConfig::default();
        if self.startup_delay_ms.is_none()
            && self.poll_period_ms.is_none()
            && self.timeout_ms.is_none()
        {
            return default;
        }

        SyncConfig::new(
            self.startup_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.startup_delay),
            self.poll_period_ms
                .map(Duration::from_millis)
                .unwrap_or(default.poll_period),
            self.timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.request_timeout),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_screen(&["program", "--token", "t"], ScreenType::Wallet)]
    #[case::explicit_wallet(&["program", "--token", "t", "--screen", "wallet"], ScreenType::Wallet)]
    #[case::explicit_admin(&["program", "--token", "t", "--screen", "admin"], ScreenType::Admin)]
    fn test_screen_parsing(#[case] args: &[&str], #[case] expected: ScreenType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        match (&parsed.screen, &expected) {
            (ScreenType::Wallet, ScreenType::Wallet) => (),
            (ScreenType::Admin, ScreenType::Admin) => (),
            _ => panic!("Expected {:?}, got {:?}", expected, parsed.screen),
        }
    }

    #[rstest]
    #[case::no_overrides(&["program", "--token", "t"], SyncConfig::default())]
    #[case::poll_period(
        &["program", "--token", "t", "--poll-period-ms", "2000"],
        SyncConfig::new(
            Duration::from_millis(5_000),
            Duration::from_millis(2_000),
            Duration::from_millis(30_000),
        )
    )]
    #[case::all_overrides(
        &["program", "--token", "t", "--startup-delay-ms", "100", "--poll-period-ms", "200", "--timeout-ms", "300"],
        SyncConfig::new(
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(300),
        )
    )]
    fn test_sync_config_conversion(#[case] args: &[&str], #[case] expected: SyncConfig) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.to_sync_config(), expected);
    }

    #[test]
    fn test_defaults() {
        let parsed = CliArgs::try_parse_from(["program", "--token", "t"]).unwrap();
        assert_eq!(parsed.api_url, "http://localhost:8000");
        assert_eq!(parsed.watch_secs, 60);
    }

    #[rstest]
    #[case::missing_token(&["program"])]
    #[case::invalid_screen(&["program", "--token", "t", "--screen", "invalid"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
