use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What to do when a watch trigger arrives for a task that is still running.
///
/// - `Queue`: keep at most one instance per task running and remember a single
///   pending re-run, started once the current instance finishes (default).
/// - `Cancel`: cancel the in-flight instance and start a fresh one.
/// - `Overlap`: start a new instance every time. Writes to the output tree may
///   land out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapBehaviour {
    #[default]
    Queue,
    Cancel,
    Overlap,
}

impl FromStr for OverlapBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(OverlapBehaviour::Queue),
            "cancel" => Ok(OverlapBehaviour::Cancel),
            "overlap" => Ok(OverlapBehaviour::Overlap),
            other => Err(format!(
                "invalid overlap behaviour: {other} (expected \"queue\", \"cancel\" or \"overlap\")"
            )),
        }
    }
}

/// Which reload signal a task emits to dev-server clients after it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Reload the whole page.
    #[default]
    Full,
    /// Refresh stylesheets in place.
    Styles,
    /// Do not notify clients.
    None,
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReloadKind::Full => "full",
            ReloadKind::Styles => "styles",
            ReloadKind::None => "none",
        };
        f.write_str(s)
    }
}
