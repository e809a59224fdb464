//! The geometric front: how far placement has progressed into the bin
//! currently being filled, and the dominance relation between two fronts.

use crate::instance::{BinPos, Instance, Length, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Front {
    pub i: BinPos,
    pub o: Orientation,
    pub x1_prev: Length,
    pub x1_curr: Length,
    pub x3_curr: Length,
    pub y2_prev: Length,
    pub y2_curr: Length,
}

/// `f1` dominates `f2`: anything reachable from `f2` is also reachable from
/// `f1`, so a sibling ending in `f2` can be safely discarded once one ending
/// in `f1` exists with an equal item-consumption vector.
#[must_use]
pub fn dominates(instance: &Instance, f1: &Front, f2: &Front) -> bool {
    if f1.i < f2.i {
        return true;
    }
    if f1.i > f2.i {
        return false;
    }
    if f1.o != f2.o {
        return false;
    }
    let h = instance.bin(f1.i).height(f1.o);
    if f2.y2_curr != h && f1.x1_prev > f2.x1_prev {
        return false;
    }
    if f1.x1_curr > f2.x1_curr {
        return false;
    }

    if f2.y2_prev < f1.y2_prev {
        if f1.x1_curr > f2.x3_curr {
            return false;
        }
    } else if f2.y2_prev < f1.y2_curr {
        if f1.x3_curr > f2.x3_curr {
            return false;
        }
    } else if f1.x1_prev > f2.x3_curr {
        return false;
    }

    if f2.y2_curr < f1.y2_prev {
        if f1.x1_curr > f2.x1_prev {
            return false;
        }
    } else if f2.y2_curr < f1.y2_curr {
        if f1.x3_curr > f2.x1_prev {
            return false;
        }
    }
    // else: f2.y2_curr >= f1.y2_curr, no further constraint.

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Bin, Instance, Item, Objective};

    fn instance() -> Instance {
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
        Instance::new(items, vec![vec![0]], bins, Objective::Default)
    }

    #[test]
    fn a_front_dominates_itself() {
        let instance = instance();
        let f = Front {
            i: 0,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 1000,
            x3_curr: 1000,
            y2_prev: 0,
            y2_curr: 500,
        };
        assert!(dominates(&instance, &f, &f));
    }

    #[test]
    fn different_bin_index_orders_by_bin() {
        let instance = instance();
        let earlier = Front {
            i: 0,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 6000,
            x3_curr: 6000,
            y2_prev: 0,
            y2_curr: 3210,
        };
        let later = Front {
            i: 1,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 0,
            x3_curr: 0,
            y2_prev: 0,
            y2_curr: 0,
        };
        assert!(dominates(&instance, &earlier, &later));
        assert!(!dominates(&instance, &later, &earlier));
    }

    #[test]
    fn mismatched_orientation_never_dominates() {
        let instance = instance();
        let f1 = Front {
            i: 0,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 1000,
            x3_curr: 1000,
            y2_prev: 0,
            y2_curr: 500,
        };
        let f2 = Front { o: Orientation::Horizontal, ..f1 };
        assert!(!dominates(&instance, &f1, &f2));
    }

    #[test]
    fn a_strictly_further_along_front_dominates_a_lagging_one() {
        let instance = instance();
        let ahead = Front {
            i: 0,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 500,
            x3_curr: 500,
            y2_prev: 0,
            y2_curr: 500,
        };
        let behind = Front {
            i: 0,
            o: Orientation::Vertical,
            x1_prev: 0,
            x1_curr: 1000,
            x3_curr: 1000,
            y2_prev: 0,
            y2_curr: 500,
        };
        assert!(dominates(&instance, &ahead, &behind));
        assert!(!dominates(&instance, &behind, &ahead));
    }
}
