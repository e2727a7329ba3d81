//! Check kinds, process-wide switches and per-check state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// The kind of contract check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Checked before the operation runs
    Pre,
    /// Checked after the operation returns
    Post,
    /// Checked around every public operation of a type
    Invariant,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [CheckKind::Pre, CheckKind::Post, CheckKind::Invariant];

    pub fn label(self) -> &'static str {
        match self {
            CheckKind::Pre => "Precondition",
            CheckKind::Post => "Postcondition",
            CheckKind::Invariant => "Invariant",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Enable flags for each check kind plus the umbrella `Contract` switch.
///
/// A kind is active only when both the umbrella and its own flag are on.
/// Reads are relaxed atomic loads so the disabled path costs nothing.
#[derive(Debug)]
pub struct CheckSwitches {
    contract: AtomicBool,
    pre: AtomicBool,
    post: AtomicBool,
    invariant: AtomicBool,
}

impl CheckSwitches {
    /// All checks enabled
    pub fn new() -> Self {
        Self {
            contract: AtomicBool::new(true),
            pre: AtomicBool::new(true),
            post: AtomicBool::new(true),
            invariant: AtomicBool::new(true),
        }
    }

    /// All checks disabled
    pub fn disabled() -> Self {
        let switches = Self::new();
        switches.set_contract_enabled(false);
        switches
    }

    fn flag(&self, kind: CheckKind) -> &AtomicBool {
        match kind {
            CheckKind::Pre => &self.pre,
            CheckKind::Post => &self.post,
            CheckKind::Invariant => &self.invariant,
        }
    }

    #[inline]
    pub fn is_enabled(&self, kind: CheckKind) -> bool {
        self.contract.load(Ordering::Relaxed) && self.flag(kind).load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, kind: CheckKind, enabled: bool) {
        self.flag(kind).store(enabled, Ordering::Relaxed);
    }

    pub fn is_contract_enabled(&self) -> bool {
        self.contract.load(Ordering::Relaxed)
    }

    /// Turning the umbrella off disables every kind regardless of its own
    /// flag; turning it back on restores the individual flags.
    pub fn set_contract_enabled(&self, enabled: bool) {
        self.contract.store(enabled, Ordering::Relaxed);
    }
}

impl Default for CheckSwitches {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckState {
    NotStarted,
    /// Old values recorded (postconditions only)
    OldValuesCaptured,
    Evaluated,
    Passed,
    /// Failed and reported, execution continues
    Reported,
    /// Failed and returned as a violation
    Raised,
}

impl CheckState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckState::Passed | CheckState::Reported | CheckState::Raised
        )
    }
}
