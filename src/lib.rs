//! # Quince
//! Quince is the precedence reasoning core of a lazy clause generation constraint solver.
//!
//! The crate maintains a directed graph of linear precedence constraints of the form
//! `tail + offset <= head` — possibly conditional on the truth of a set of presence literals, and
//! possibly with the offset augmented by the lower bound of an integer variable — and performs two
//! intertwined duties:
//!
//! - **Propagation.** Whenever the lower bound of an integer variable changes or a presence
//!   literal becomes true, [`propagators::precedences::PrecedencesPropagator`] tightens the lower
//!   bounds of all variables reachable through the active arcs, detects infeasibility (positive
//!   weight cycles, or pushes that exceed an upper bound), and propagates the absence of
//!   conditional arcs that can no longer fit.
//! - **Offline analysis.** Before search, or between phases,
//!   [`propagators::precedences::PrecedenceRelations`] derives a work-limited transitive closure
//!   of the unconditional precedence relation and extracts full precedence records, while the
//!   extraction passes of the propagator discover greater-than-at-least-one-of structure implied
//!   by the mutual exclusion of incoming conditional arcs.
//!
//! The SAT clause database, the surrounding search loop and the model layer are external
//! collaborators; they are reached through the interfaces in [`engine::sat`] and the assignment
//! structures in [`engine`].

pub mod basic_types;
pub mod engine;
pub mod propagators;
pub mod quince_asserts;
