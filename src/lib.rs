#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

//! A solver for the two/three-staged guillotine rectangle packing problem
//! with defects: given a set of stacked items and one or more bins (possibly
//! carrying rectangular defects), find a sequence of edge-to-edge cuts that
//! packs as much value as the chosen objective asks for.
//!
//! The search is a depth-first branch-and-bound over an insertion tree: each
//! [`node::Node`] is an immutable partial solution, [`node::Node::children`]
//! is the move generator, and [`guide`] orders which child gets explored
//! first. [`search::run`] drives the recursion and [`solution`] turns the
//! winning leaf back into a placed-item tree.

pub mod branching;
pub mod error;
pub mod front;
pub mod guide;
pub mod insertion;
pub mod instance;
pub mod node;
pub mod search;
pub mod solution;

pub use branching::{BranchingScheme, Parameters};
pub use error::{CoreError, CoreResult};
pub use instance::{Bin, Defect, Instance, Item, Objective, Orientation};
pub use node::Node;
pub use search::IncumbentSink;
pub use solution::Solution;

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

/// Builds the branching scheme and runs the search to (soft) completion,
/// logging progress the way a long-running solve is expected to.
pub fn solve(
    instance: std::sync::Arc<instance::Instance>,
    params: branching::Parameters,
    guide_id: u8,
    time_limit: Option<std::time::Duration>,
) -> error::CoreResult<Option<solution::Solution>> {
    log::info!(start!("building branching scheme"));
    let scheme = branching::BranchingScheme::new(instance, params)?;
    log::info!(working!("searching, guide {}"), guide_id);
    let sink = std::sync::Arc::new(search::IncumbentSink::new(scheme.instance().objective()));
    let solution = search::run(&scheme, guide_id, time_limit, &sink);
    match &solution {
        Some(sol) => log::info!(success!("found a solution: {} items, profit {}"), sol.item_number, sol.profit),
        None => log::info!("search finished without a feasible solution"),
    }
    Ok(solution)
}
