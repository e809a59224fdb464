//! Immutable partial-solution nodes and the insertion generator.

use std::rc::Rc;
use std::sync::Arc;

use log::trace;

use crate::branching::{BranchingScheme, CutType1, CutType2};
use crate::front::{self, Front};
use crate::insertion::{
    Depth, Insertion, DF_NEW_BIN_HORIZONTAL, DF_NEW_BIN_VERTICAL, DF_NEW_STRIP, DF_NEW_SUBPLATE, DF_SAME_SUBPLATE,
};
use crate::instance::{Area, BinPos, ItemPos, ItemTypeId, Length, Orientation, Profit, StackId};

/// An item placed above a defect inside the current stage-2 subplate; must
/// be re-validated whenever that subplate grows upward.
#[derive(Debug, Clone, Copy)]
pub struct AboveDefectItem {
    pub item: ItemTypeId,
    pub rotated: bool,
    pub x: Length,
}

struct NodeInner {
    scheme: Arc<BranchingScheme>,
    father: Option<Node>,
    insertion: Insertion,
    pos_stack: Vec<ItemPos>,
    bin_number: BinPos,
    first_stage_orientation: Orientation,
    item_number: ItemPos,
    item_area: Area,
    squared_item_area: i128,
    current_area: Area,
    waste: Area,
    profit: Profit,
    x1_prev: Length,
    y2_prev: Length,
    subplate2_items_above_defect: Vec<AboveDefectItem>,
}

#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    #[must_use]
    pub fn root(scheme: Arc<BranchingScheme>) -> Node {
        let stack_number = scheme.instance().stack_number();
        let first_stage_orientation = scheme.first_stage_orientation();
        Node(Rc::new(NodeInner {
            scheme,
            father: None,
            insertion: Insertion {
                j1: None,
                j2: None,
                df: DF_NEW_BIN_VERTICAL,
                x1: 0,
                y2: 0,
                x3: 0,
                x1_max: -1,
                y2_max: -1,
                z1: 0,
                z2: 0,
            },
            pos_stack: vec![0; stack_number],
            bin_number: 0,
            first_stage_orientation,
            item_number: 0,
            item_area: 0,
            squared_item_area: 0,
            current_area: 0,
            waste: 0,
            profit: 0,
            x1_prev: 0,
            y2_prev: 0,
            subplate2_items_above_defect: Vec::new(),
        }))
    }

    /// Builds the child obtained by applying `insertion` to `father`.
    #[must_use]
    pub fn child(father: &Node, insertion: Insertion) -> Node {
        let scheme = father.0.scheme.clone();
        let instance = scheme.instance();

        let mut bin_number = father.bin_number();
        let mut first_stage_orientation = father.0.first_stage_orientation;
        if insertion.df < 0 {
            bin_number += 1;
            first_stage_orientation = Node::last_bin_orientation_for(father, insertion.df);
        }

        let i = bin_number - 1;
        let o = first_stage_orientation;
        let w_j = insertion.x3 - father.x3_prev(insertion.df);
        let rotate_j2 = match insertion.j2 {
            Some(j2) => instance.width(instance.item(j2), true, o) == w_j,
            None => false,
        };

        let mut subplate2_items_above_defect = if insertion.df == DF_SAME_SUBPLATE {
            father.0.subplate2_items_above_defect.clone()
        } else {
            Vec::new()
        };
        if insertion.j1.is_none() {
            if let Some(j2) = insertion.j2 {
                subplate2_items_above_defect.push(AboveDefectItem {
                    item: j2,
                    rotated: rotate_j2,
                    x: father.x3_prev(insertion.df),
                });
            }
        }

        let (x1_prev, y2_prev) = match insertion.df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL => (0, 0),
            DF_NEW_STRIP => (father.0.insertion.x1, 0),
            DF_NEW_SUBPLATE => (father.0.x1_prev, father.0.insertion.y2),
            DF_SAME_SUBPLATE => (father.0.x1_prev, father.0.y2_prev),
            _ => unreachable!("invalid depth {}", insertion.df),
        };

        let mut pos_stack = father.0.pos_stack.clone();
        let mut item_number = father.0.item_number;
        let mut item_area = father.0.item_area;
        let mut squared_item_area = father.0.squared_item_area;
        let mut profit = father.0.profit;
        for j in [insertion.j1, insertion.j2].into_iter().flatten() {
            let item = instance.item(j);
            pos_stack[item.stack] += 1;
            item_number += 1;
            item_area += item.area();
            squared_item_area += i128::from(item.area()) * i128::from(item.area());
            profit += item.profit;
        }

        let h = instance.bin(i).height(o);
        let w = instance.bin(i).width(o);
        let full = item_number == instance_item_number(instance);
        let current_area = instance.previous_bin_area(i)
            + if full {
                if scheme.cut_type_1() == CutType1::ThreeStaged {
                    insertion.x1 * h
                } else {
                    insertion.y2 * w
                }
            } else {
                x1_prev * h + (insertion.x1 - x1_prev) * y2_prev + (insertion.x3 - x1_prev) * (insertion.y2 - y2_prev)
            };
        let waste = current_area - item_area;
        debug_assert!(waste >= 0, "negative waste computed for a child node");

        Node(Rc::new(NodeInner {
            scheme: father.0.scheme.clone(),
            father: Some(father.clone()),
            insertion,
            pos_stack,
            bin_number,
            first_stage_orientation,
            item_number,
            item_area,
            squared_item_area,
            current_area,
            waste,
            profit,
            x1_prev,
            y2_prev,
            subplate2_items_above_defect,
        }))
    }

    fn last_bin_orientation_for(_node: &Node, df: Depth) -> Orientation {
        match df {
            DF_NEW_BIN_VERTICAL => Orientation::Vertical,
            DF_NEW_BIN_HORIZONTAL => Orientation::Horizontal,
            _ => unreachable!(),
        }
    }

    // -- getters ---------------------------------------------------------

    #[must_use]
    pub fn scheme(&self) -> &Arc<BranchingScheme> {
        &self.0.scheme
    }

    #[must_use]
    pub fn father(&self) -> Option<&Node> {
        self.0.father.as_ref()
    }

    #[must_use]
    pub fn insertion(&self) -> &Insertion {
        &self.0.insertion
    }

    #[must_use]
    pub fn item_number(&self) -> ItemPos {
        self.0.item_number
    }

    #[must_use]
    pub fn full(&self) -> bool {
        self.0.item_number == instance_item_number(self.0.scheme.instance())
    }

    #[must_use]
    pub fn bin_number(&self) -> BinPos {
        self.0.bin_number
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.0.current_area
    }

    #[must_use]
    pub fn item_area(&self) -> Area {
        self.0.item_area
    }

    #[must_use]
    pub fn squared_item_area(&self) -> i128 {
        self.0.squared_item_area
    }

    #[must_use]
    pub fn profit(&self) -> Profit {
        self.0.profit
    }

    #[must_use]
    pub fn waste(&self) -> Area {
        self.0.waste
    }

    #[must_use]
    pub fn waste_percentage(&self) -> f64 {
        self.0.waste as f64 / self.0.current_area as f64
    }

    #[must_use]
    pub fn mean_item_area(&self) -> f64 {
        self.0.item_area as f64 / self.0.item_number as f64
    }

    #[must_use]
    pub fn mean_squared_item_area(&self) -> f64 {
        self.0.squared_item_area as f64 / self.0.item_number as f64
    }

    /// Mirrors the upstream accessor pair verbatim: both `width()` and
    /// `height()` read the same coordinate regardless of name. Preserved
    /// rather than "fixed" — see `DESIGN.md`.
    #[must_use]
    pub fn width(&self) -> Length {
        if self.0.scheme.cut_type_1() == CutType1::ThreeStaged {
            self.x1_curr()
        } else {
            self.y2_curr()
        }
    }

    #[must_use]
    pub fn height(&self) -> Length {
        if self.0.scheme.cut_type_1() == CutType1::ThreeStaged {
            self.x1_curr()
        } else {
            self.y2_curr()
        }
    }

    #[must_use]
    pub fn pos_stack(&self, s: StackId) -> ItemPos {
        self.0.pos_stack[s]
    }

    #[must_use]
    pub fn pos_stack_vec(&self) -> &[ItemPos] {
        &self.0.pos_stack
    }

    #[must_use]
    pub fn last_insertion_defect(&self) -> bool {
        self.0.bin_number > 0 && self.0.insertion.is_defect_only()
    }

    #[must_use]
    pub fn x1_curr(&self) -> Length {
        self.0.insertion.x1
    }

    #[must_use]
    pub fn y2_curr(&self) -> Length {
        self.0.insertion.y2
    }

    #[must_use]
    pub fn x3_curr(&self) -> Length {
        self.0.insertion.x3
    }

    #[must_use]
    pub fn x1_prev_own(&self) -> Length {
        self.0.x1_prev
    }

    #[must_use]
    pub fn y2_prev_own(&self) -> Length {
        self.0.y2_prev
    }

    #[must_use]
    pub fn z1(&self) -> u8 {
        self.0.insertion.z1
    }

    #[must_use]
    pub fn z2(&self) -> u8 {
        self.0.insertion.z2
    }

    #[must_use]
    pub fn front(&self) -> Front {
        Front {
            i: if self.0.bin_number == 0 { 0 } else { self.0.bin_number - 1 },
            o: self.0.first_stage_orientation,
            x1_prev: self.0.x1_prev,
            x1_curr: self.x1_curr(),
            x3_curr: self.x3_curr(),
            y2_prev: self.0.y2_prev,
            y2_curr: self.y2_curr(),
        }
    }

    /// True when this node cannot possibly beat `incumbent` for the
    /// instance's objective, so the search driver should prune it.
    #[must_use]
    pub fn bound(&self, incumbent: &crate::search::Incumbent) -> bool {
        use crate::instance::Objective;
        let instance = self.0.scheme.instance();
        match instance.objective() {
            Objective::Default => {
                if !incumbent.full {
                    self.ubkp() <= incumbent.profit
                } else if self.ubkp() != incumbent.profit {
                    self.ubkp() <= incumbent.profit
                } else {
                    self.waste() >= incumbent.waste
                }
            }
            Objective::BinPacking => {
                if !incumbent.full {
                    return false;
                }
                let mut i_pos: i64 = -1;
                let mut a = instance.item_area() + self.waste();
                while a > 0 {
                    i_pos += 1;
                    a -= instance.bin(i_pos as usize).area();
                }
                (i_pos + 1) as usize >= incumbent.bin_number
            }
            Objective::BinPackingWithLeftovers => {
                if !incumbent.full {
                    return false;
                }
                self.waste() >= incumbent.waste
            }
            Objective::Knapsack => self.ubkp() <= incumbent.profit,
            Objective::StripPackingWidth => {
                if !incumbent.full {
                    return false;
                }
                let bound = self
                    .width()
                    .max((self.waste() + instance.item_area() - 1) / instance.bin(0).height(Orientation::Vertical) + 1);
                bound >= incumbent.width
            }
            Objective::StripPackingHeight => {
                if !incumbent.full {
                    return false;
                }
                let bound = self
                    .height()
                    .max((self.waste() + instance.item_area() - 1) / instance.bin(0).height(Orientation::Horizontal) + 1);
                bound >= incumbent.height
            }
        }
    }

    /// Knapsack upper bound: all remaining items fit, or a loose admissible
    /// proxy based on the instance's most profit-dense item.
    #[must_use]
    pub fn ubkp(&self) -> Profit {
        let instance = self.0.scheme.instance();
        let remaining_item_area = instance.item_area() - self.item_area();
        let remaining_packable_area = instance.packable_area() - self.area();
        if remaining_packable_area >= remaining_item_area {
            instance.item_profit()
        } else {
            match instance.max_efficiency_item() {
                Some(j) => {
                    let item = instance.item(j);
                    self.0.profit + remaining_packable_area * item.profit / item.area()
                }
                None => self.0.profit,
            }
        }
    }

    // -- depth-relative accessors (mirrors last_bin/x1_prev(df)/etc.) ----

    fn last_bin(&self, df: Depth) -> BinPos {
        if df <= DF_NEW_BIN_VERTICAL {
            if self.0.bin_number == 0 {
                0
            } else {
                self.0.bin_number
            }
        } else {
            self.0.bin_number - 1
        }
    }

    fn last_bin_orientation(&self, df: Depth) -> Orientation {
        match df {
            DF_NEW_BIN_VERTICAL => Orientation::Vertical,
            DF_NEW_BIN_HORIZONTAL => Orientation::Horizontal,
            _ => self.0.first_stage_orientation,
        }
    }

    fn x1_prev(&self, df: Depth) -> Length {
        match df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL => 0,
            DF_NEW_STRIP => self.x1_curr(),
            DF_NEW_SUBPLATE | DF_SAME_SUBPLATE => self.0.x1_prev,
            _ => unreachable!(),
        }
    }

    fn x3_prev(&self, df: Depth) -> Length {
        match df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL => 0,
            DF_NEW_STRIP => self.x1_curr(),
            DF_NEW_SUBPLATE => self.0.x1_prev,
            DF_SAME_SUBPLATE => self.x3_curr(),
            _ => unreachable!(),
        }
    }

    fn y2_prev(&self, df: Depth) -> Length {
        match df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL | DF_NEW_STRIP => 0,
            DF_NEW_SUBPLATE => self.y2_curr(),
            DF_SAME_SUBPLATE => self.0.y2_prev,
            _ => unreachable!(),
        }
    }

    fn x1_max(&self, df: Depth) -> Length {
        let instance = self.0.scheme.instance();
        match df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL | DF_NEW_STRIP => {
                let i = self.last_bin(df);
                let o = self.last_bin_orientation(df);
                let mut x = instance.bin(i).width(o);
                if let Some(max1cut) = self.0.scheme.max1cut() {
                    x = x.min(self.x1_prev(df) + max1cut);
                }
                x
            }
            DF_NEW_SUBPLATE => {
                let i = self.last_bin(df);
                let po = self.last_bin_orientation(df);
                let mut x = self.0.insertion.x1_max;
                if !self.0.scheme.cut_through_defects() {
                    for k in &instance.bin(i).defects {
                        if instance.bottom(k, po) < self.y2_curr()
                            && instance.top(k, po) > self.y2_curr()
                            && instance.left(k, po) > self.0.x1_prev
                            && x > instance.left(k, po)
                        {
                            x = instance.left(k, po);
                        }
                    }
                }
                x
            }
            DF_SAME_SUBPLATE => self.0.insertion.x1_max,
            _ => unreachable!(),
        }
    }

    fn y2_max(&self, df: Depth, x3: Length) -> Length {
        let instance = self.0.scheme.instance();
        let i = self.last_bin(df);
        let o = self.last_bin_orientation(df);
        let mut y = if df == DF_SAME_SUBPLATE {
            self.0.insertion.y2_max
        } else {
            instance.bin(i).height(o)
        };
        if !self.0.scheme.cut_through_defects() {
            for k in &instance.bin(i).defects {
                if instance.left(k, o) < x3 && instance.right(k, o) > x3 && instance.bottom(k, o) >= self.y2_prev(df) && y > instance.bottom(k, o) {
                    y = instance.bottom(k, o);
                }
            }
        }
        y
    }

    fn front_at(&self, insertion: &Insertion) -> Front {
        let i = self.last_bin(insertion.df);
        let o = self.last_bin_orientation(insertion.df);
        match insertion.df {
            DF_NEW_BIN_VERTICAL | DF_NEW_BIN_HORIZONTAL => Front {
                i,
                o,
                x1_prev: 0,
                x3_curr: insertion.x3,
                x1_curr: insertion.x1,
                y2_prev: 0,
                y2_curr: insertion.y2,
            },
            DF_NEW_STRIP => Front {
                i,
                o,
                x1_prev: self.x1_curr(),
                x3_curr: insertion.x3,
                x1_curr: insertion.x1,
                y2_prev: 0,
                y2_curr: insertion.y2,
            },
            DF_NEW_SUBPLATE => Front {
                i,
                o,
                x1_prev: self.0.x1_prev,
                x3_curr: insertion.x3,
                x1_curr: insertion.x1,
                y2_prev: self.y2_curr(),
                y2_curr: insertion.y2,
            },
            DF_SAME_SUBPLATE => Front {
                i,
                o,
                x1_prev: self.0.x1_prev,
                x3_curr: insertion.x3,
                x1_curr: insertion.x1,
                y2_prev: self.0.y2_prev,
                y2_curr: insertion.y2,
            },
            _ => unreachable!(),
        }
    }

    // -- insertion generation ---------------------------------------------

    /// Enumerates every legal candidate move out of this node.
    #[must_use]
    pub fn children(&self) -> Vec<Insertion> {
        let mut insertions = Vec::new();
        if self.full() {
            return insertions;
        }

        let instance = self.0.scheme.instance();

        let mut df_min: Depth = DF_NEW_BIN_HORIZONTAL;
        if self.0.bin_number == instance.bin_number() {
            df_min = DF_NEW_STRIP;
        } else if self.0.scheme.first_stage_orientation_param() == FirstStageOrientationParam::Vertical {
            df_min = DF_NEW_BIN_VERTICAL;
        } else if self.0.scheme.first_stage_orientation_param() == FirstStageOrientationParam::Any
            && instance.bin(self.0.bin_number).defects.is_empty()
            && instance.bin(self.0.bin_number).w == instance.bin(self.0.bin_number).h
            && self.0.scheme.no_oriented_items()
        {
            df_min = DF_NEW_BIN_VERTICAL;
        }

        let df_max: Depth = if self.0.father.is_none() { DF_NEW_BIN_VERTICAL } else { DF_SAME_SUBPLATE };

        let mut df = df_max;
        while df >= df_min {
            if df == DF_NEW_BIN_VERTICAL && self.0.scheme.first_stage_orientation_param() == FirstStageOrientationParam::Horizontal {
                df -= 1;
                continue;
            }

            let mut stop = false;
            for ins in &insertions {
                if ins.j1.is_none() && ins.j2.is_none() {
                    continue;
                }
                if df == DF_NEW_SUBPLATE && ins.x1 == self.x1_curr() && ins.y2 == self.y2_curr() {
                    stop = true;
                    break;
                } else if df == DF_NEW_STRIP && ins.x1 == self.x1_curr() {
                    stop = true;
                    break;
                } else if df < 0 && ins.df >= 0 {
                    stop = true;
                    break;
                }
            }
            if stop {
                break;
            }

            let o = self.last_bin_orientation(df);
            let x = self.x3_prev(df);
            let y = self.y2_prev(df);

            for s in 0..instance.stack_number() {
                if self.0.pos_stack[s] == instance.stack_size(s) {
                    continue;
                }
                if let Some(sp) = instance.stack_pred(s) {
                    if self.0.pos_stack[sp] <= self.0.pos_stack[s] {
                        continue;
                    }
                }

                let j = instance.item_in_stack(s, self.0.pos_stack[s]).id;

                if !self.0.scheme.oriented(j) {
                    let b = instance.item(j).w > instance.item(j).h;
                    self.insertion_1_item(&mut insertions, j, !b, df);
                    self.insertion_1_item(&mut insertions, j, b, df);
                } else {
                    self.insertion_1_item(&mut insertions, j, false, df);
                }

                if self.0.scheme.cut_type_2() == CutType2::Roadef2018 {
                    for s2 in s..instance.stack_number() {
                        let mut j2;
                        if s2 == s {
                            if self.0.pos_stack[s2] + 1 == instance.stack_size(s2) {
                                continue;
                            }
                            if let Some(sp2) = instance.stack_pred(s2) {
                                if self.0.pos_stack[sp2] <= self.0.pos_stack[s2] {
                                    continue;
                                }
                            }
                            j2 = instance.item_in_stack(s2, self.0.pos_stack[s2] + 1).id;
                        } else {
                            if self.0.pos_stack[s2] == instance.stack_size(s2) {
                                continue;
                            }
                            let sp2 = instance.stack_pred(s2);
                            let skip = match sp2 {
                                Some(sp2) if sp2 == s => self.0.pos_stack[sp2] + 1 <= self.0.pos_stack[s2],
                                Some(sp2) => self.0.pos_stack[sp2] <= self.0.pos_stack[s2],
                                None => false,
                            };
                            if skip {
                                continue;
                            }
                            j2 = instance.item_in_stack(s2, self.0.pos_stack[s2]).id;
                        }

                        let mut j_bottom = j;
                        if j2 < j_bottom {
                            std::mem::swap(&mut j_bottom, &mut j2);
                        }
                        let item1 = instance.item(j_bottom);
                        let item2 = instance.item(j2);
                        if instance.width(item1, false, o) == instance.width(item2, false, o) {
                            self.insertion_2_items(&mut insertions, j_bottom, false, j2, false, df);
                        }
                        if !self.0.scheme.oriented(j2) && instance.width(item1, false, o) == instance.width(item2, true, o) {
                            self.insertion_2_items(&mut insertions, j_bottom, false, j2, true, df);
                        }
                        if !self.0.scheme.oriented(j_bottom) && instance.width(item1, true, o) == instance.width(item2, false, o) {
                            self.insertion_2_items(&mut insertions, j_bottom, true, j2, false, df);
                        }
                        if !self.0.scheme.oriented(j2) && !self.0.scheme.oriented(j_bottom) && instance.width(item1, true, o) == instance.width(item2, true, o) {
                            self.insertion_2_items(&mut insertions, j_bottom, true, j2, true, df);
                        }
                    }
                }
            }

            if self.0.father.is_none() || !self.0.insertion.is_defect_only() {
                for defect in &instance.bin(self.last_bin(df)).defects {
                    if instance.left(defect, o) >= x && instance.bottom(defect, o) >= y {
                        self.insertion_defect(&mut insertions, defect.id, df);
                    }
                }
            }

            df -= 1;
        }

        insertions
    }

    fn insertion_1_item(&self, insertions: &mut Vec<Insertion>, j: ItemTypeId, rotate: bool, df: Depth) {
        let instance = self.0.scheme.instance();
        let i = self.last_bin(df);
        let o = self.last_bin_orientation(df);
        let item = *instance.item(j);
        let x = self.x3_prev(df) + instance.width(&item, rotate, o);
        let y = self.y2_prev(df) + instance.height(&item, rotate, o);
        let w = instance.bin(i).width(o);
        let h = instance.bin(i).height(o);
        if x > w || y > h {
            return;
        }

        if df == DF_SAME_SUBPLATE && self.0.scheme.cut_type_2() == CutType2::Homogenous && self.0.insertion.j1 != Some(j) {
            return;
        }

        let mut insertion = Insertion {
            j1: Some(j),
            j2: None,
            df,
            x1: x,
            y2: y,
            x3: x,
            x1_max: self.x1_max(df),
            y2_max: self.y2_max(df, x),
            z1: 0,
            z2: 0,
        };

        if instance.item_intersects_defect(self.x3_prev(df), self.y2_prev(df), &item, rotate, i, o).is_some() {
            if matches!(self.0.scheme.cut_type_2(), CutType2::Roadef2018 | CutType2::NonExact) {
                insertion.j1 = None;
                insertion.j2 = Some(j);
            } else {
                return;
            }
        }

        if matches!(self.0.scheme.cut_type_2(), CutType2::Exact | CutType2::Homogenous) {
            insertion.z2 = 2;
        }

        self.update(insertions, insertion);
    }

    fn insertion_2_items(&self, insertions: &mut Vec<Insertion>, j1: ItemTypeId, rotate1: bool, j2: ItemTypeId, rotate2: bool, df: Depth) {
        let instance = self.0.scheme.instance();
        let i = self.last_bin(df);
        let o = self.last_bin_orientation(df);
        let item1 = *instance.item(j1);
        let item2 = *instance.item(j2);
        let w = instance.bin(i).width(o);
        let h = instance.bin(i).height(o);
        let h_j1 = instance.height(&item1, rotate1, o);
        let x = self.x3_prev(df) + instance.width(&item1, rotate1, o);
        let y = self.y2_prev(df) + h_j1 + instance.height(&item2, rotate2, o);
        if x > w || y > h {
            return;
        }
        if instance.item_intersects_defect(self.x3_prev(df), self.y2_prev(df), &item1, rotate1, i, o).is_some()
            || instance.item_intersects_defect(self.x3_prev(df), self.y2_prev(df) + h_j1, &item2, rotate2, i, o).is_some()
        {
            return;
        }

        let insertion = Insertion {
            j1: Some(j1),
            j2: Some(j2),
            df,
            x1: x,
            y2: y,
            x3: x,
            x1_max: self.x1_max(df),
            y2_max: self.y2_max(df, x),
            z1: 0,
            z2: 2,
        };

        self.update(insertions, insertion);
    }

    fn insertion_defect(&self, insertions: &mut Vec<Insertion>, k: crate::instance::DefectId, df: Depth) {
        let instance = self.0.scheme.instance();
        let i = self.last_bin(df);
        let o = self.last_bin_orientation(df);
        let w = instance.bin(i).width(o);
        let h = instance.bin(i).height(o);
        let min_waste = self.0.scheme.min_waste();
        let defect = *instance.defect(k);
        let x = (instance.right(&defect, o)).max(self.x3_prev(df) + min_waste);
        let y = (instance.top(&defect, o)).max(self.y2_prev(df) + min_waste);
        if x > w || y > h {
            return;
        }

        let insertion = Insertion {
            j1: None,
            j2: None,
            df,
            x1: x,
            y2: y,
            x3: x,
            x1_max: self.x1_max(df),
            y2_max: self.y2_max(df, x),
            z1: 1,
            z2: 1,
        };

        self.update(insertions, insertion);
    }

    /// The full constraint closure applied to a raw candidate: enforces
    /// min/max cut lengths, the two-stage and `one2cut` special cases,
    /// continuation into an existing strip/subplate, defect closures with
    /// reinspection of items placed above a defect, and sibling dominance.
    /// Silently drops the candidate (returns without pushing) on any
    /// infeasibility — this *is* how the generator expresses rejection.
    fn update(&self, insertions: &mut Vec<Insertion>, mut insertion: Insertion) {
        let scheme = &self.0.scheme;
        let instance = scheme.instance();
        let min_waste = scheme.min_waste();
        let i = self.last_bin(insertion.df);
        let o = self.last_bin_orientation(insertion.df);
        let w = instance.bin(i).width(o);
        let h = instance.bin(i).height(o);

        let has_item = insertion.j1.is_some() || insertion.j2.is_some();

        // 1. min1cut
        if has_item && insertion.x1 - self.x1_prev(insertion.df) < scheme.min1cut() {
            if insertion.z1 == 0 {
                insertion.x1 = (insertion.x1 + min_waste).max(self.x1_prev(insertion.df) + scheme.min1cut());
                insertion.z1 = 1;
            } else {
                insertion.x1 = self.x1_prev(insertion.df) + scheme.min1cut();
            }
        }

        // 2. min2cut
        if has_item && insertion.y2 - self.y2_prev(insertion.df) < scheme.min2cut() {
            if insertion.z2 == 0 {
                insertion.y2 = (insertion.y2 + min_waste).max(self.y2_prev(insertion.df) + scheme.min2cut());
                insertion.z2 = 1;
            } else if insertion.z2 == 1 {
                insertion.y2 = self.y2_prev(insertion.df) + scheme.min2cut();
            } else {
                return;
            }
        }

        // 3. one2cut
        if scheme.one2cut() && insertion.df == DF_NEW_SUBPLATE && self.y2_prev(insertion.df) != 0 && insertion.y2 != h {
            if insertion.z2 == 0 {
                if insertion.y2 + min_waste > h {
                    return;
                }
                insertion.y2 = h;
            } else if insertion.z2 == 1 {
                insertion.y2 = h;
            } else {
                return;
            }
        }

        // 4. two-stage fixup
        if scheme.cut_type_1() == CutType1::TwoStaged && insertion.x1 != w {
            if insertion.z1 == 0 {
                if insertion.x1 + min_waste > w {
                    return;
                }
                insertion.x1 = w;
            } else {
                insertion.x1 = w;
            }
        }

        // 5. continuation into an existing stage-1 strip
        if insertion.df >= DF_NEW_SUBPLATE {
            if insertion.z1 == 0 {
                if insertion.x1 + min_waste <= self.x1_curr() {
                    insertion.x1 = self.x1_curr();
                    insertion.z1 = self.z1();
                } else if insertion.x1 < self.x1_curr() {
                    if self.z1() == 0 {
                        insertion.x1 = self.x1_curr() + min_waste;
                        insertion.z1 = 1;
                    } else {
                        insertion.x1 += min_waste;
                        insertion.z1 = 1;
                    }
                } else if insertion.x1 == self.x1_curr() {
                    // nothing to do
                } else if self.z1() == 0 && insertion.x1 < self.x1_curr() + min_waste {
                    insertion.x1 += min_waste;
                    insertion.z1 = 1;
                }
            } else if insertion.x1 <= self.x1_curr() {
                insertion.x1 = self.x1_curr();
                insertion.z1 = self.z1();
            } else if self.z1() == 0 && self.x1_curr() + min_waste > insertion.x1 {
                insertion.x1 = self.x1_curr() + min_waste;
            }
        }

        // 6. continuation into an existing stage-2 subplate
        if insertion.df == DF_SAME_SUBPLATE {
            let y2_curr = self.y2_curr();
            match insertion.z2 {
                0 => {
                    if insertion.y2 + min_waste <= y2_curr {
                        insertion.y2 = y2_curr;
                        insertion.z2 = self.z2();
                    } else if insertion.y2 < y2_curr {
                        if self.z2() == 2 {
                            return;
                        } else if self.z2() == 0 {
                            insertion.y2 = y2_curr + min_waste;
                            insertion.z2 = 1;
                        } else {
                            insertion.y2 += min_waste;
                            insertion.z2 = 1;
                        }
                    } else if insertion.y2 == y2_curr {
                        if self.z2() == 2 {
                            insertion.z2 = 2;
                        }
                    } else if insertion.y2 < y2_curr + min_waste {
                        if self.z2() == 2 {
                            return;
                        } else if self.z2() == 0 {
                            insertion.y2 += min_waste;
                            insertion.z2 = 1;
                        }
                        // self.z2() == 1: the source falls through here
                        // without adjustment. Preserved verbatim.
                    } else if self.z2() == 2 {
                        return;
                    }
                }
                1 => {
                    if insertion.y2 <= y2_curr {
                        insertion.y2 = y2_curr;
                        insertion.z2 = self.z2();
                    } else if insertion.y2 < y2_curr + min_waste {
                        if self.z2() == 2 {
                            return;
                        } else if self.z2() == 0 {
                            insertion.y2 = y2_curr + min_waste;
                        }
                    } else if self.z2() == 2 {
                        return;
                    }
                }
                _ => {
                    if insertion.y2 < y2_curr {
                        return;
                    } else if insertion.y2 == y2_curr {
                        // nothing to do
                    } else if insertion.y2 < y2_curr + min_waste {
                        if self.z2() == 2 || self.z2() == 0 {
                            return;
                        }
                    } else if self.z2() == 2 {
                        return;
                    }
                }
            }
        }

        // 7. defect closure on x1
        loop {
            let Some(k) = instance.x_intersects_defect(insertion.x1, i, o) else {
                break;
            };
            let defect = *instance.defect(k);
            insertion.x1 = if insertion.z1 == 0 {
                instance.right(&defect, o).max(insertion.x1 + min_waste)
            } else {
                instance.right(&defect, o)
            };
            insertion.z1 = 1;
        }

        // 8. border halo on x1
        if insertion.x1 < w && insertion.x1 + min_waste > w {
            if insertion.z1 == 1 {
                insertion.x1 = w;
                insertion.z1 = 0;
            } else {
                return;
            }
        }

        // 9. upper bound on x1
        if insertion.x1 > insertion.x1_max {
            return;
        }

        // 10. defect closure on y2 with reinspection of above-defect items
        let y2_fixed = insertion.z2 == 2 || (insertion.df == DF_SAME_SUBPLATE && self.z2() == 2);
        loop {
            let mut found = false;

            if let Some(k) = instance.y_intersects_defect(self.x1_prev(insertion.df), insertion.x1, insertion.y2, i, o) {
                if y2_fixed {
                    return;
                }
                let defect = *instance.defect(k);
                insertion.y2 = if insertion.z2 == 0 {
                    instance.top(&defect, o).max(insertion.y2 + min_waste)
                } else {
                    instance.top(&defect, o)
                };
                insertion.z2 = 1;
                found = true;
            }

            if insertion.df == DF_SAME_SUBPLATE {
                for above in self.0.subplate2_items_above_defect.clone() {
                    let item = *instance.item(above.item);
                    let h_j2 = instance.height(&item, above.rotated, o);
                    if let Some(k) = instance.item_intersects_defect(above.x, insertion.y2 - h_j2, &item, above.rotated, i, o) {
                        if y2_fixed {
                            return;
                        }
                        let defect = *instance.defect(k);
                        insertion.y2 = if insertion.z2 == 0 {
                            (instance.top(&defect, o) + h_j2).max(insertion.y2 + min_waste)
                        } else {
                            instance.top(&defect, o) + h_j2
                        };
                        insertion.z2 = 1;
                        found = true;
                    }
                }
            }

            if insertion.j1.is_none() {
                if let Some(j2) = insertion.j2 {
                    let item = *instance.item(j2);
                    let w_j = insertion.x3 - self.x3_prev(insertion.df);
                    let rotate_j2 = instance.width(&item, true, o) == w_j;
                    let h_j2 = instance.height(&item, rotate_j2, o);
                    let l = self.x3_prev(insertion.df);
                    if let Some(k) = instance.item_intersects_defect(l, insertion.y2 - h_j2, &item, rotate_j2, i, o) {
                        if y2_fixed {
                            return;
                        }
                        let defect = *instance.defect(k);
                        insertion.y2 = if insertion.z2 == 0 {
                            (instance.top(&defect, o) + h_j2).max(insertion.y2 + min_waste)
                        } else {
                            instance.top(&defect, o) + h_j2
                        };
                        insertion.z2 = 1;
                        found = true;
                    }
                }
            }

            if !found {
                break;
            }
        }

        // 11. border halo on y2
        if insertion.y2 < h && insertion.y2 + min_waste > h {
            if insertion.z2 == 1 {
                insertion.y2 = h;
                insertion.z2 = 0;

                if insertion.df == DF_SAME_SUBPLATE {
                    for above in &self.0.subplate2_items_above_defect {
                        let item = *instance.item(above.item);
                        let h_j2 = instance.height(&item, above.rotated, o);
                        if instance.item_intersects_defect(above.x, insertion.y2 - h_j2, &item, above.rotated, i, o).is_some() {
                            return;
                        }
                    }
                }

                if insertion.j1.is_none() {
                    if let Some(j2) = insertion.j2 {
                        let item = *instance.item(j2);
                        let w_j = insertion.x3 - self.x3_prev(insertion.df);
                        let rotate_j2 = instance.width(&item, true, o) == w_j;
                        let h_j2 = instance.height(&item, rotate_j2, o);
                        let l = self.x3_prev(insertion.df);
                        if instance.item_intersects_defect(l, insertion.y2 - h_j2, &item, rotate_j2, i, o).is_some() {
                            return;
                        }
                    }
                }
            } else {
                return;
            }
        }

        // 12. upper bound on y2
        if insertion.y2 > insertion.y2_max {
            return;
        }

        // 13. front-level dominance against accumulated siblings
        let mut idx = 0;
        while idx < insertions.len() {
            let it = insertions[idx];
            let mut advance = true;

            if insertion.is_defect_only() && it.is_defect_only() && insertion.df != DF_NEW_BIN_VERTICAL && insertion.x1 == it.x1 && insertion.y2 == it.y2 && insertion.x3 == it.x3 {
                return;
            }

            if !it.is_defect_only()
                && (insertion.j1.is_none() || insertion.j1 == it.j1 || insertion.j1 == it.j2)
                && (insertion.j2.is_none() || insertion.j2 == it.j2 || insertion.j2 == it.j2)
                && front::dominates(instance, &self.front_at(&it), &self.front_at(&insertion))
            {
                return;
            }

            if has_item && (it.j1 == insertion.j1 || it.j1 == insertion.j2) && (it.j2 == insertion.j2 || it.j2 == insertion.j1) && front::dominates(instance, &self.front_at(&insertion), &self.front_at(&it)) {
                insertions.swap_remove(idx);
                advance = false;
            }

            if advance {
                idx += 1;
            }
        }

        insertions.push(insertion);
        trace!("accepted insertion {insertion:?}");
    }
}

fn instance_item_number(instance: &crate::instance::Instance) -> ItemPos {
    (0..instance.stack_number()).map(|s| instance.stack_size(s)).sum()
}

pub use crate::branching::FirstStageOrientationParam;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::Parameters;
    use crate::instance::{Bin, Instance, Item, Objective};
    use crate::search::Incumbent;

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
    fn root_has_no_items_and_zero_area() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        assert_eq!(root.item_number(), 0);
        assert_eq!(root.area(), 0);
        assert!(!root.full());
    }

    #[test]
    fn a_single_item_instance_becomes_full_after_one_child() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let children = scheme.children(&root);
        assert!(!children.is_empty());
        let placed = children.into_iter().find(|n| n.item_number() == 1).unwrap();
        assert!(placed.full());
        assert_eq!(placed.item_area(), 500 * 1000);
    }

    #[test]
    fn ubkp_never_exceeds_total_instance_profit_at_the_root() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        assert!(root.ubkp() <= scheme.instance().item_profit());
    }

    fn incumbent(full: bool, profit: Profit, waste: Area) -> Incumbent {
        Incumbent {
            full,
            profit,
            waste,
            bin_number: usize::MAX,
            width: Length::MAX,
            height: Length::MAX,
        }
    }

    #[test]
    fn bound_prunes_a_node_whose_ubkp_cannot_beat_the_incumbent() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let incumbent = incumbent(true, root.ubkp() + 1, Area::MAX);
        assert!(root.bound(&incumbent));
    }

    #[test]
    fn bound_does_not_prune_when_the_incumbent_has_not_improved_on_ubkp() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        let incumbent = incumbent(true, root.ubkp(), 1);
        assert!(!root.bound(&incumbent));
    }

    #[test]
    fn children_called_twice_returns_equal_insertion_lists() {
        let scheme = roadef_fixture();
        let root = scheme.root();
        assert_eq!(root.children(), root.children());
    }
}
