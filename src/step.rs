//! Stage gating
//!
//! Both analyses run a fixed sequence of five steps. A single step
//! number selects how far to go: `0` runs everything, `k` runs steps
//! `1..=k`.
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{Error, Result};

pub const MAX_STEP: u8 = 5;

/// Requested processing depth
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StepSelection(u8);

impl StepSelection {
    pub const ALL: Self = Self(0);

    pub fn new(depth: u8) -> Result<Self> {
        if depth > MAX_STEP {
            return Err(Error::InvalidStep(depth));
        }
        Ok(Self(depth))
    }

    pub fn depth(self) -> u8 {
        self.0
    }

    /// Whether step `k` has to be run
    pub fn includes(self, k: u8) -> bool {
        self.0 == 0 || self.0 >= k
    }

    /// The steps to run, in order
    pub fn active<'a>(self, steps: &'a [Step]) -> impl Iterator<Item = &'a Step> {
        steps.iter().filter(move |s| self.includes(s.index))
    }
}

impl FromStr for StepSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let depth: u8 = s
            .parse()
            .map_err(|_| format!("Invalid step number: {s}"))?;
        Self::new(depth).map_err(|err| err.to_string())
    }
}

impl Display for StepSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "all steps"),
            1 => write!(f, "only step 1"),
            n => write!(f, "up to step {n}"),
        }
    }
}

/// Storage type of an input column
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ColumnKind {
    F32,
    U32,
    /// A variable-length array of floats per event
    F32Vec,
}

/// An input column read by a step
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn f32(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::F32)
    }

    pub fn u32(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::U32)
    }

    pub fn f32_vec(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::F32Vec)
    }
}

/// One step of an analysis together with the input columns it reads
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    pub index: u8,
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
}

impl Step {
    pub fn new(index: u8, name: &'static str, columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        Self {
            index,
            name,
            columns: columns.into_iter().collect(),
        }
    }
}

/// Names of all columns needed by the active steps
pub fn required_columns(steps: &[Step], selection: StepSelection) -> Vec<&str> {
    selection
        .active(steps)
        .flat_map(|s| s.columns.iter().map(|c| c.name.as_str()))
        .collect()
}

/// The four kinematic columns `<prefix>_{pt,eta,phi,m}`
pub fn kinematic_columns(prefix: &str) -> [ColumnSpec; 4] {
    ["pt", "eta", "phi", "m"].map(|var| ColumnSpec::f32_vec(format!("{prefix}_{var}")))
}
