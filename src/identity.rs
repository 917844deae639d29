use std::env;

/// Who created a log: stored in its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub owner: Option<String>,
    pub process_id: u32,
}

// Checked in order; the first non-empty value wins.
const OWNER_VARS: [&str; 3] = ["USER", "LOGNAME", "USERNAME"];

impl ProcessIdentity {
    /// Identity of the running process.
    ///
    /// The owner is looked up best-effort from the environment and is `None`
    /// when no login name is available (daemons, containers).
    pub fn current() -> Self {
        Self {
            owner: current_owner(),
            process_id: std::process::id(),
        }
    }
}

fn current_owner() -> Option<String> {
    OWNER_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|name| !name.is_empty())
}
