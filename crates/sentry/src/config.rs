//! Sentry configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use behavior_tree::TreeConfig;

/// Configuration of one sentry session.
#[derive(Clone, Debug)]
pub struct SentryConfig {
    /// Identity stored in the session state.
    pub uid: String,
    /// Number of ticks to run; `0` runs until interrupted.
    pub ticks: u64,
    pub tick_interval: Duration,
    /// Tree description to load instead of the bundled guard tree.
    pub tree_path: Option<PathBuf>,
    pub tree: TreeConfig,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            uid: "sentry-1".to_owned(),
            ticks: 40,
            tick_interval: Duration::from_millis(250),
            tree_path: None,
            tree: TreeConfig::default(),
        }
    }
}

impl SentryConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `SENTRY_UID`
    /// - `SENTRY_TICKS`
    /// - `SENTRY_TICK_MS`
    /// - `SENTRY_TREE` (path to a JSON tree description)
    /// - `BT_ROOT_ID` / `BT_TREE_DEBUG`, see [`TreeConfig::from_env`]. The
    ///   bundled tree's reset target assumes root `0`.
    pub fn from_env() -> Self {
        let mut config = Self {
            tree: TreeConfig::from_env(),
            ..Self::default()
        };

        if let Ok(uid) = env::var("SENTRY_UID")
            && !uid.trim().is_empty()
        {
            config.uid = uid.trim().to_owned();
        }

        if let Some(ticks) = read_env::<u64>("SENTRY_TICKS") {
            config.ticks = ticks;
        }

        if let Some(ms) = read_env::<u64>("SENTRY_TICK_MS") {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }

        config.tree_path = env::var_os("SENTRY_TREE").map(PathBuf::from);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
