//! Hook types and the set of hooks enabled at startup.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The upload lifecycle points at which a hook can fire.
///
/// The string identifiers are part of the backend contract (hook file
/// names, the `Hook-Name` header, metric labels) and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookType {
    /// Fired synchronously before an upload is admitted. Can reject it.
    PreCreate,
    /// Fired after an upload has been created.
    PostCreate,
    /// Fired while upload data is being received.
    PostReceive,
    /// Fired after an upload has completed.
    PostFinish,
    /// Fired after an upload has been terminated.
    PostTerminate,
}

impl HookType {
    /// All hook types, in declaration order.
    pub const ALL: [HookType; 5] = [
        Self::PreCreate,
        Self::PostCreate,
        Self::PostReceive,
        Self::PostFinish,
        Self::PostTerminate,
    ];

    /// Returns the literal identifier of this hook type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreCreate => "pre-create",
            Self::PostCreate => "post-create",
            Self::PostReceive => "post-receive",
            Self::PostFinish => "post-finish",
            Self::PostTerminate => "post-terminate",
        }
    }

    /// Returns whether this hook is invoked synchronously as a veto gate.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::PreCreate)
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|hook| hook.as_str() == s.trim())
            .ok_or_else(|| AppError::configuration(format!("Unknown hook type '{s}'")))
    }
}

/// The set of hook types that will be dispatched.
///
/// Computed once from configuration; any type missing from the set is a
/// constant no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledHooks(BTreeSet<HookType>);

impl EnabledHooks {
    /// Creates a set containing every hook type.
    pub fn all() -> Self {
        Self(HookType::ALL.into_iter().collect())
    }

    /// Creates an empty set.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns whether the given hook type is enabled.
    pub fn contains(&self, hook: HookType) -> bool {
        self.0.contains(&hook)
    }

    /// Returns whether no hook type is enabled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the enabled hook types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = HookType> + '_ {
        self.0.iter().copied()
    }

    /// Comma separated list of identifiers, e.g. `pre-create, post-finish`.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|hook| hook.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for EnabledHooks {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<HookType> for EnabledHooks {
    fn from_iter<I: IntoIterator<Item = HookType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for EnabledHooks {
    type Err = AppError;

    /// Parses a comma separated list such as `pre-create,post-finish`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(HookType::from_str)
            .collect()
    }
}
