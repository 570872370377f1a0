//! Autoresolve - abstract combat auto-resolution
//!
//! Formations of units fight a multi-round battle without anyone issuing
//! per-unit orders. A decision layer queues `Action`s; the
//! `SimulationManager` resolves them phase by phase with seeded dice and
//! reports what happened.

pub mod actions;
pub mod battle;
pub mod core;
pub mod simulation;
