//! Depth-first branch-and-bound search driver.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::branching::BranchingScheme;
use crate::guide::{Guide, LessThan};
use crate::instance::{Area, BinPos, Length, Objective, Profit};
use crate::node::Node;
use crate::solution::{self, Solution};

/// A cheap, `Copy` summary of the best node found so far, queried by
/// [`Node::bound`] without needing to touch the full solution export.
#[derive(Debug, Clone, Copy)]
pub struct Incumbent {
    pub full: bool,
    pub profit: Profit,
    pub waste: Area,
    pub bin_number: BinPos,
    pub width: Length,
    pub height: Length,
}

impl Incumbent {
    fn worst(objective: Objective) -> Incumbent {
        let _ = objective;
        Incumbent {
            full: false,
            profit: 0,
            waste: Area::MAX,
            bin_number: usize::MAX,
            width: Length::MAX,
            height: Length::MAX,
        }
    }

    fn from_node(node: &Node) -> Incumbent {
        Incumbent {
            full: node.full(),
            profit: node.profit(),
            waste: node.waste(),
            bin_number: node.bin_number(),
            width: node.width(),
            height: node.height(),
        }
    }

    /// Whether `node` strictly improves on this incumbent for `objective`.
    fn improved_by(&self, node: &Node, objective: Objective) -> bool {
        if !node.full() {
            return false;
        }
        if !self.full {
            return true;
        }
        match objective {
            Objective::Default | Objective::Knapsack => {
                node.profit() > self.profit || (node.profit() == self.profit && node.waste() < self.waste)
            }
            Objective::BinPacking => node.bin_number() < self.bin_number || (node.bin_number() == self.bin_number && node.waste() < self.waste),
            Objective::BinPackingWithLeftovers => node.waste() < self.waste,
            Objective::StripPackingWidth => node.width() < self.width,
            Objective::StripPackingHeight => node.height() < self.height,
        }
    }
}

/// The best-solution-so-far, shared across every worker searching the same
/// instance. Workers only communicate through this: each offers nodes as it
/// finds them and prunes against the current snapshot, with no other
/// cross-worker coordination.
pub struct IncumbentSink {
    objective: Objective,
    best: RwLock<(Incumbent, Option<Node>)>,
}

impl IncumbentSink {
    #[must_use]
    pub fn new(objective: Objective) -> IncumbentSink {
        IncumbentSink {
            objective,
            best: RwLock::new((Incumbent::worst(objective), None)),
        }
    }

    fn snapshot(&self) -> Incumbent {
        self.best.read().expect("incumbent lock poisoned").0
    }

    fn offer(&self, node: &Node) {
        let mut guard = self.best.write().expect("incumbent lock poisoned");
        if guard.0.improved_by(node, self.objective) {
            guard.0 = Incumbent::from_node(node);
            guard.1 = Some(node.clone());
        }
    }

    /// The best node any worker has offered so far, if any.
    #[must_use]
    pub fn best_node(&self) -> Option<Node> {
        self.best.read().expect("incumbent lock poisoned").1.clone()
    }
}

/// Runs the depth-first branch-and-bound search to (soft) completion or
/// until `time_limit` elapses, returning the best solution found.
///
/// `sink` is the cross-worker incumbent: pass the same `Arc<IncumbentSink>`
/// to concurrently-running `run` calls with distinct `guide_id`s so they
/// prune against each other's discoveries, per the shared-sink worker model.
#[must_use]
pub fn run(scheme: &Arc<BranchingScheme>, guide_id: u8, time_limit: Option<Duration>, sink: &Arc<IncumbentSink>) -> Option<Solution> {
    let guide = Guide::from_id(guide_id);
    let deadline = time_limit.map(|d| Instant::now() + d);

    let root = scheme.root();
    rec(scheme, &guide, sink, deadline, &root);

    sink.best_node().and_then(|node| solution::convert(&node))
}

fn rec(scheme: &Arc<BranchingScheme>, guide: &Guide, sink: &IncumbentSink, deadline: Option<Instant>, node_cur: &Node) {
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return;
        }
    }

    if node_cur.bound(&sink.snapshot()) {
        return;
    }

    let mut children = Vec::new();
    for insertion in node_cur.children() {
        let child = scheme.child(node_cur, insertion);

        if child.bound(&sink.snapshot()) {
            continue;
        }

        sink.offer(&child);

        if !child.full() {
            children.push(child);
        }
    }

    children.sort_by(|a, b| {
        if guide.less_than(a, b) {
            std::cmp::Ordering::Less
        } else if guide.less_than(b, a) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    for child in &children {
        rec(scheme, guide, sink, deadline, child);
    }
}
