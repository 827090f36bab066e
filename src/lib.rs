//! Jet reconstruction and grooming tutorial analyses
//!
//! Two analyses fill named histograms from a columnar ROOT tree, step by
//! step:
//!
//! - [exp] studies pre-built R=0.4 jets: pileup dependence, the jet
//!   vertex fraction, track jets and the jet response.
//! - [groom] rebuilds R=1.0 jets from their constituents, grooms them and
//!   computes substructure observables.
//!
//! The histograms are written to a JSON container, which the [plot]
//! module turns into a multi-page PDF summary.
#![warn(clippy::all, rust_2018_idioms)]

pub mod analysis;
pub mod clustering;
pub mod columns;
pub mod config;
pub mod error;
pub mod event;
pub mod exp;
pub mod fit;
pub mod font;
pub mod groom;
pub mod grooming;
pub mod histogram;
pub mod kinematics;
pub mod opt;
pub mod plot;
pub mod step;
pub mod style;
pub mod substructure;

pub use error::{Error, Result};
