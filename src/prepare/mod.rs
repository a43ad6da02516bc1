//! Table preparation stages.
//!
//! This module takes the raw agency export from file to model-ready matrix:
//! cleaning and date filtering, the calendar-date weather join, punctuality
//! feature derivation, categorical encoding, and the train/test split. Each
//! stage reports what it dropped so shrinking row counts stay explainable.

pub mod clean;
pub mod encode;
pub mod features;
pub mod frame;
pub mod merge;
pub mod split;
