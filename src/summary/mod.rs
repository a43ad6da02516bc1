//! Punctuality summaries over a derived table.
//!
//! This module aggregates derived rows into per-route statistics with letter
//! grades, day-type and monthly breakdowns, and weather severity tables, for
//! reporting on the console as JSON.

pub mod aggregate;
pub mod grade;
pub mod types;
pub mod utility;
