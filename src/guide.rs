//! Guide comparators: the orderings used to decide which child of a node
//! the depth-first search should descend into first.
//!
//! Each variant is a `less_than(node_1, node_2)` relation plugged into the
//! search driver's sort. Ties are broken by `pos_stack` lexicographic order
//! so the comparator is a strict weak ordering. Guide 4's fallback on a
//! zero-profit `node_2` returns `true` unconditionally rather than mirroring
//! guides 0-3's symmetric-looking "return false" — this asymmetry is
//! intentional in the upstream comparator and is kept verbatim.

use enum_dispatch::enum_dispatch;

use crate::node::Node;

#[enum_dispatch]
pub trait LessThan {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool;
}

fn pos_stack_tiebreak(node_1: &Node, node_2: &Node) -> bool {
    let instance = node_1.scheme().instance();
    for s in 0..instance.stack_number() {
        if node_1.pos_stack(s) != node_2.pos_stack(s) {
            return node_1.pos_stack(s) < node_2.pos_stack(s);
        }
    }
    false
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WastePercentage;
impl LessThan for WastePercentage {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.area() == 0 {
            return node_2.area() != 0;
        }
        if node_2.area() == 0 {
            return false;
        }
        if node_1.waste_percentage() != node_2.waste_percentage() {
            return node_1.waste_percentage() < node_2.waste_percentage();
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WastePercentagePerMeanItemArea;
impl LessThan for WastePercentagePerMeanItemArea {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.area() == 0 {
            return node_2.area() != 0;
        }
        if node_2.area() == 0 {
            return false;
        }
        if node_1.item_number() == 0 {
            return node_2.item_number() != 0;
        }
        if node_2.item_number() == 0 {
            return true;
        }
        let v1 = node_1.waste_percentage() / node_1.mean_item_area();
        let v2 = node_2.waste_percentage() / node_2.mean_item_area();
        if v1 != v2 {
            return v1 < v2;
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WastePercentageOffsetPerMeanItemArea;
impl LessThan for WastePercentageOffsetPerMeanItemArea {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.area() == 0 {
            return node_2.area() != 0;
        }
        if node_2.area() == 0 {
            return false;
        }
        if node_1.item_number() == 0 {
            return node_2.item_number() != 0;
        }
        if node_2.item_number() == 0 {
            return true;
        }
        let v1 = (0.1 + node_1.waste_percentage()) / node_1.mean_item_area();
        let v2 = (0.1 + node_2.waste_percentage()) / node_2.mean_item_area();
        if v1 != v2 {
            return v1 < v2;
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WastePercentageOffsetPerMeanSquaredItemArea;
impl LessThan for WastePercentageOffsetPerMeanSquaredItemArea {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.area() == 0 {
            return node_2.area() != 0;
        }
        if node_2.area() == 0 {
            return false;
        }
        if node_1.item_number() == 0 {
            return node_2.item_number() != 0;
        }
        if node_2.item_number() == 0 {
            return true;
        }
        let v1 = (0.1 + node_1.waste_percentage()) / node_1.mean_squared_item_area();
        let v2 = (0.1 + node_2.waste_percentage()) / node_2.mean_squared_item_area();
        if v1 != v2 {
            return v1 < v2;
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AreaPerProfit;
impl LessThan for AreaPerProfit {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.profit() == 0 {
            return node_2.profit() != 0;
        }
        if node_2.profit() == 0 {
            return true;
        }
        let v1 = node_1.area() as f64 / node_1.profit() as f64;
        let v2 = node_2.area() as f64 / node_2.profit() as f64;
        if v1 != v2 {
            return v1 < v2;
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AreaPerProfitPerMeanItemArea;
impl LessThan for AreaPerProfitPerMeanItemArea {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.profit() == 0 {
            return node_2.profit() != 0;
        }
        if node_2.profit() == 0 {
            return true;
        }
        if node_1.item_number() == 0 {
            return node_2.item_number() != 0;
        }
        if node_2.item_number() == 0 {
            return true;
        }
        let v1 = node_1.area() as f64 / node_1.profit() as f64 / node_1.mean_item_area();
        let v2 = node_2.area() as f64 / node_2.profit() as f64 / node_2.mean_item_area();
        if v1 != v2 {
            return v1 < v2;
        }
        pos_stack_tiebreak(node_1, node_2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Waste;
impl LessThan for Waste {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        node_1.waste() < node_2.waste()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ubkp;
impl LessThan for Ubkp {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        node_1.ubkp() < node_2.ubkp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UbkpThenWaste;
impl LessThan for UbkpThenWaste {
    fn less_than(&self, node_1: &Node, node_2: &Node) -> bool {
        if node_1.ubkp() != node_2.ubkp() {
            return node_1.ubkp() < node_2.ubkp();
        }
        node_1.waste() < node_2.waste()
    }
}

#[enum_dispatch(LessThan)]
#[derive(Debug, Clone, Copy)]
pub enum Guide {
    WastePercentage,
    WastePercentagePerMeanItemArea,
    WastePercentageOffsetPerMeanItemArea,
    WastePercentageOffsetPerMeanSquaredItemArea,
    AreaPerProfit,
    AreaPerProfitPerMeanItemArea,
    Waste,
    Ubkp,
    UbkpThenWaste,
}

impl Guide {
    #[must_use]
    pub fn from_id(guide_id: u8) -> Guide {
        match guide_id {
            0 => Guide::WastePercentage(WastePercentage),
            1 => Guide::WastePercentagePerMeanItemArea(WastePercentagePerMeanItemArea),
            2 => Guide::WastePercentageOffsetPerMeanItemArea(WastePercentageOffsetPerMeanItemArea),
            3 => Guide::WastePercentageOffsetPerMeanSquaredItemArea(WastePercentageOffsetPerMeanSquaredItemArea),
            4 => Guide::AreaPerProfit(AreaPerProfit),
            5 => Guide::AreaPerProfitPerMeanItemArea(AreaPerProfitPerMeanItemArea),
            6 => Guide::Waste(Waste),
            7 => Guide::Ubkp(Ubkp),
            _ => Guide::UbkpThenWaste(UbkpThenWaste),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::{BranchingScheme, Parameters};
    use crate::instance::{Bin, Instance, Item, Objective};
    use std::sync::Arc;

    fn roadef_fixture() -> Arc<BranchingScheme> {
        let items = vec![Item {
            id: 0,
            stack: 0,
            position_in_stack: 0,
            w: 500,
            h: 1000,
            profit: 500_000,
            copies: 1,
            oriented: false,
        }];
        let bins = vec![Bin {
            w: 6000,
            h: 3210,
            defects: Vec::new(),
        }];
        let instance = Arc::new(Instance::new(items, vec![vec![0]], bins, Objective::Default));
        let mut params = Parameters::default();
        params.set_roadef2018();
        BranchingScheme::new(instance, params).unwrap()
    }

    #[test]
    fn from_id_maps_known_ids_to_expected_variants() {
        assert!(matches!(Guide::from_id(0), Guide::WastePercentage(_)));
        assert!(matches!(Guide::from_id(4), Guide::AreaPerProfit(_)));
        assert!(matches!(Guide::from_id(7), Guide::Ubkp(_)));
        assert!(matches!(Guide::from_id(8), Guide::UbkpThenWaste(_)));
        assert!(matches!(Guide::from_id(255), Guide::UbkpThenWaste(_)));
    }

    #[test]
    fn waste_percentage_treats_an_empty_node_as_least() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let child = scheme.children(&root).into_iter().next().unwrap();
        assert_eq!(root.area(), 0);
        assert_ne!(child.area(), 0);
        assert!(WastePercentage.less_than(&root, &child));
        assert!(!WastePercentage.less_than(&child, &root));
    }

    #[test]
    fn every_guide_is_irreflexive_on_an_identical_node() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let child = scheme.children(&root).into_iter().next().unwrap();
        for guide_id in 0..=8u8 {
            let guide = Guide::from_id(guide_id);
            assert!(!guide.less_than(&child, &child), "guide {guide_id} was not irreflexive");
        }
    }

    #[test]
    fn guide_four_zero_profit_tiebreak_is_asymmetric() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let child = scheme.children(&root).into_iter().next().unwrap();
        assert_eq!(root.profit(), 0);
        assert_ne!(child.profit(), 0);
        // Both orderings report "less than": an intentionally preserved
        // asymmetry, not a strict weak ordering, for this guide's fallback.
        assert!(AreaPerProfit.less_than(&root, &child));
        assert!(AreaPerProfit.less_than(&child, &root));
    }
}
