//! wingtrim: paraglider line-trim tuning
//!
//! Imports rigging-line measurements, maps lines to trim groups through a
//! wing profile, and computes deviations before and after maillon loop
//! changes and group adjustments, along with a loop plan that brings every
//! group back toward its nominal length.

pub mod cli;
pub mod core;
pub mod entities;
pub mod io;
