//! Tree-level configuration structures and loaders.
use std::env;

/// Options applied when a tree is prepared and ticked.
#[derive(Clone, Debug)]
pub struct TreeConfig {
    /// Identity assigned to the root node. Descendants get dotted child paths.
    pub root_id: String,
    /// Emit every node tick at `debug` level together with a state snapshot.
    pub debug: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_id: "0".to_owned(),
            debug: false,
        }
    }
}

impl TreeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BT_ROOT_ID` - Identity of the root node (default: `0`)
    /// - `BT_TREE_DEBUG` - Log node ticks with state snapshots when set to `1`,
    ///   `true` or nothing (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root_id) = env::var("BT_ROOT_ID")
            && !root_id.trim().is_empty()
        {
            config.root_id = root_id.trim().to_owned();
        }

        if let Ok(raw) = env::var("BT_TREE_DEBUG") {
            config.debug = enables_debug(&raw);
        }

        config
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn enables_debug(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "1" || raw.eq_ignore_ascii_case("true")
}
