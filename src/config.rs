use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grooming::{
    BottomUpSoftDrop, Groomer, GroomingVariant, Pruner, RecursiveSoftDrop, SoftDrop, Trimmer,
};

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubstructureConfig {
    pub beta: f64,
}

impl Default for SubstructureConfig {
    fn default() -> Self {
        Self { beta: 1. }
    }
}

/// Jet definition and grooming parameters of the groom pipeline
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroomingConfig {
    pub radius: f64,
    pub trimming: Trimmer,
    pub pruning: Pruner,
    pub soft_drop: SoftDrop,
    pub recursive_soft_drop: RecursiveSoftDrop,
    pub bottom_up_soft_drop: BottomUpSoftDrop,
    pub bottom_up_soft_drop_tight: BottomUpSoftDrop,
    pub substructure: SubstructureConfig,
}

impl Default for GroomingConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            trimming: Default::default(),
            pruning: Default::default(),
            soft_drop: Default::default(),
            recursive_soft_drop: Default::default(),
            bottom_up_soft_drop: Default::default(),
            bottom_up_soft_drop_tight: BottomUpSoftDrop::tight(),
            substructure: Default::default(),
        }
    }
}

impl GroomingConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading grooming configuration from {path:?}");
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// The groomers applied to our own jets, in histogram order
    pub fn groomers(&self) -> Vec<(GroomingVariant, Box<dyn Groomer>)> {
        use GroomingVariant::*;
        vec![
            (Pruned, Box::new(self.pruning)),
            (SoftDrop, Box::new(self.soft_drop)),
            (RecursiveSoftDrop, Box::new(self.recursive_soft_drop)),
            (BottomUpSoftDrop, Box::new(self.bottom_up_soft_drop)),
            (BottomUpSoftDropTight, Box::new(self.bottom_up_soft_drop_tight)),
        ]
    }
}
