//! Solution export: turns an insertion chain into a guillotine cut tree of
//! bins, waste rectangles and placed items, plus a post-hoc invariant check.

use crate::insertion::{DF_NEW_BIN_HORIZONTAL, DF_NEW_BIN_VERTICAL};
use crate::instance::{Area, BinPos, Instance, ItemPos, ItemTypeId, Length, Orientation, Profit};
use crate::node::Node;

pub type SolutionNodeId = usize;

/// What a leaf of the cut tree represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeContent {
    /// An internal cut node with children.
    Intermediate,
    /// A placed copy of an item type.
    Item(ItemTypeId),
    /// Waste trimmed off the end of a strip or subplate.
    Waste,
    /// Waste at the very end of the last bin, beyond the last real cut.
    Residual,
}

#[derive(Debug, Clone)]
pub struct SolutionNode {
    pub id: SolutionNodeId,
    pub father: Option<SolutionNodeId>,
    pub depth: u8,
    pub bin: BinPos,
    pub l: Length,
    pub r: Length,
    pub b: Length,
    pub t: Length,
    pub children: Vec<SolutionNodeId>,
    pub content: NodeContent,
}

impl SolutionNode {
    fn width(&self) -> Length {
        self.r - self.l
    }

    fn height(&self) -> Length {
        self.t - self.b
    }
}

/// A fully reconstructed packing: a guillotine-cut tree per bin plus the
/// aggregate statistics the search driver uses for comparison.
#[derive(Debug, Clone)]
pub struct Solution {
    pub nodes: Vec<SolutionNode>,
    pub bin_roots: Vec<SolutionNodeId>,
    pub first_stage_orientations: Vec<Orientation>,
    pub item_number: ItemPos,
    pub profit: Profit,
    pub waste: Area,
    pub bin_number: BinPos,
    pub full: bool,
}

#[derive(Clone, Copy)]
enum RawFather {
    Bin(usize),
    Node(usize),
}

struct RawNode {
    father: RawFather,
    p: Length,
}

/// Builds a [`Solution`] from the chain of insertions leading to `node`.
/// Returns `None` if the reconstructed tree fails its invariant check.
#[must_use]
pub fn convert(node: &Node) -> Option<Solution> {
    let scheme = node.scheme();
    let instance: &Instance = scheme.instance();

    let mut chain = Vec::new();
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        let father = n.father().cloned();
        if father.is_some() {
            chain.push(n.clone());
        }
        cur = father;
    }
    chain.reverse();

    let mut first_stage_orientations: Vec<Orientation> = Vec::new();
    let mut raw: Vec<RawNode> = Vec::new();
    let mut raw_items: Vec<(ItemTypeId, usize)> = Vec::new();
    let mut nodes_curr: [Option<usize>; 4] = [None; 4];

    for n in &chain {
        let insertion = n.insertion();

        if insertion.df < 0 {
            first_stage_orientations.push(match insertion.df {
                DF_NEW_BIN_VERTICAL => Orientation::Vertical,
                DF_NEW_BIN_HORIZONTAL => Orientation::Horizontal,
                _ => unreachable!(),
            });
        }

        let attach_id: usize = if insertion.df >= 0 {
            (raw.len() as isize + 2 - insertion.df as isize) as usize
        } else {
            raw.len() + 2
        };
        if let Some(j1) = insertion.j1 {
            raw_items.push((j1, attach_id));
        }
        if let Some(j2) = insertion.j2 {
            raw_items.push((j2, attach_id));
        }

        let mut f = if insertion.df <= 0 {
            RawFather::Bin(first_stage_orientations.len() - 1)
        } else {
            RawFather::Node(nodes_curr[insertion.df as usize].expect("parent stage node must already exist"))
        };
        let mut d: i8 = if insertion.df < 0 { 0 } else { insertion.df };
        loop {
            raw.push(RawNode { father: f, p: 0 });
            let new_id = raw.len() - 1;
            f = RawFather::Node(new_id);
            d += 1;
            nodes_curr[d as usize] = Some(new_id);
            if d == 3 {
                break;
            }
        }

        raw[nodes_curr[1].unwrap()].p = insertion.x1;
        raw[nodes_curr[2].unwrap()].p = insertion.y2;
        raw[nodes_curr[3].unwrap()].p = insertion.x3;
    }

    let bin_number = first_stage_orientations.len();
    let mut nodes: Vec<SolutionNode> = Vec::with_capacity(raw.len() + bin_number);
    for id in 0..raw.len() {
        nodes.push(SolutionNode {
            id,
            father: None,
            depth: 0,
            bin: 0,
            l: 0,
            r: 0,
            b: 0,
            t: 0,
            children: Vec::new(),
            content: NodeContent::Intermediate,
        });
    }
    let mut bin_roots = Vec::with_capacity(bin_number);
    for (i, &o) in first_stage_orientations.iter().enumerate() {
        let id = nodes.len();
        bin_roots.push(id);
        nodes.push(SolutionNode {
            id,
            father: None,
            depth: 0,
            bin: i,
            l: 0,
            r: instance.bin(i).width(o),
            b: 0,
            t: instance.bin(i).height(o),
            children: Vec::new(),
            content: NodeContent::Intermediate,
        });
    }

    for id in 0..raw.len() {
        let father_id = match raw[id].father {
            RawFather::Node(f) => f,
            RawFather::Bin(i) => bin_roots[i],
        };
        let depth = nodes[father_id].depth + 1;
        let bin = nodes[father_id].bin;
        let last_child = nodes[father_id].children.last().copied();
        if depth == 1 || depth == 3 {
            let r = raw[id].p;
            let l = last_child.map_or(nodes[father_id].l, |c| nodes[c].r);
            nodes[id].father = Some(father_id);
            nodes[id].depth = depth;
            nodes[id].bin = bin;
            nodes[id].l = l;
            nodes[id].r = r;
            nodes[id].b = nodes[father_id].b;
            nodes[id].t = nodes[father_id].t;
        } else {
            let t = raw[id].p;
            let b = last_child.map_or(nodes[father_id].b, |c| nodes[c].t);
            nodes[id].father = Some(father_id);
            nodes[id].depth = depth;
            nodes[id].bin = bin;
            nodes[id].t = t;
            nodes[id].b = b;
            nodes[id].l = nodes[father_id].l;
            nodes[id].r = nodes[father_id].r;
        }
        nodes[father_id].children.push(id);
    }

    let min_waste = scheme.min_waste();
    let total = nodes.len();
    for f in 0..total {
        let Some(&c_last) = nodes[f].children.last() else {
            continue;
        };
        let depth = nodes[f].depth;
        if (depth == 0 || depth == 2) && nodes[f].r != nodes[c_last].r {
            if nodes[f].r - nodes[c_last].r < min_waste {
                nodes[c_last].r = nodes[f].r;
            } else {
                let id = nodes.len();
                let new_node = SolutionNode {
                    id,
                    father: Some(f),
                    depth: depth + 1,
                    bin: nodes[f].bin,
                    l: nodes[c_last].r,
                    r: nodes[f].r,
                    b: nodes[f].b,
                    t: nodes[f].t,
                    children: Vec::new(),
                    content: NodeContent::Waste,
                };
                nodes.push(new_node);
                nodes[f].children.push(id);
            }
        } else if (depth == 1 || depth == 3) && nodes[f].t != nodes[c_last].t {
            if nodes[f].t - nodes[c_last].t < min_waste {
                nodes[c_last].t = nodes[f].t;
            } else {
                let id = nodes.len();
                let new_node = SolutionNode {
                    id,
                    father: Some(f),
                    depth: depth + 1,
                    bin: nodes[f].bin,
                    l: nodes[f].l,
                    r: nodes[f].r,
                    b: nodes[c_last].t,
                    t: nodes[f].t,
                    children: Vec::new(),
                    content: NodeContent::Waste,
                };
                nodes.push(new_node);
                nodes[f].children.push(id);
            }
        }
    }

    for (j, id) in raw_items {
        let item = *instance.item(j);
        let wj = item.w;
        let hj = item.h;
        if !nodes[id].children.is_empty() {
            let c = nodes[id].children[1];
            nodes[c].content = NodeContent::Item(j);
            continue;
        }
        if (nodes[id].height() == hj && nodes[id].width() == wj) || (nodes[id].height() == wj && nodes[id].width() == hj) {
            nodes[id].content = NodeContent::Item(j);
            continue;
        }

        let t = if nodes[id].width() == wj { hj } else { wj };
        let bin = nodes[id].bin;
        let o = first_stage_orientations[bin];
        let l = nodes[id].l;
        let r = nodes[id].r;
        let b = nodes[id].b;
        let defect = instance.rect_intersects_defect(l, r, b, b + t, bin, o);

        if defect.is_none() {
            let c1 = nodes.len();
            nodes.push(SolutionNode {
                id: c1,
                father: Some(id),
                depth: nodes[id].depth + 1,
                bin,
                l,
                r,
                b,
                t: b + t,
                children: Vec::new(),
                content: NodeContent::Item(j),
            });
            nodes[id].children.push(c1);
            let top = nodes[id].t;
            let c2 = nodes.len();
            nodes.push(SolutionNode {
                id: c2,
                father: Some(id),
                depth: nodes[id].depth + 1,
                bin,
                l,
                r,
                b: b + t,
                t: top,
                children: Vec::new(),
                content: NodeContent::Waste,
            });
            nodes[id].children.push(c2);
        } else {
            let top = nodes[id].t;
            let c1 = nodes.len();
            nodes.push(SolutionNode {
                id: c1,
                father: Some(id),
                depth: nodes[id].depth + 1,
                bin,
                l,
                r,
                b,
                t: top - t,
                children: Vec::new(),
                content: NodeContent::Waste,
            });
            nodes[id].children.push(c1);
            let c2 = nodes.len();
            nodes.push(SolutionNode {
                id: c2,
                father: Some(id),
                depth: nodes[id].depth + 1,
                bin,
                l,
                r,
                b: top - t,
                t: top,
                children: Vec::new(),
                content: NodeContent::Item(j),
            });
            nodes[id].children.push(c2);
        }
    }

    if scheme.cut_type_1() == crate::branching::CutType1::TwoStaged {
        for id in 0..nodes.len() {
            if nodes[id].depth == 0 {
                let only_child = nodes[id].children[0];
                nodes[id].children = nodes[only_child].children.clone();
            }
        }
        for id in 0..nodes.len() {
            if nodes[id].depth == 2 {
                nodes[id].father = nodes[id].father.and_then(|f| nodes[f].father);
            }
            if nodes[id].depth >= 2 {
                nodes[id].depth -= 1;
            }
        }
    }

    for n in &mut nodes {
        let o = first_stage_orientations[n.bin];
        if o == Orientation::Horizontal {
            std::mem::swap(&mut n.l, &mut n.b);
            std::mem::swap(&mut n.r, &mut n.t);
        }
    }

    let item_number = node.item_number();
    let profit = node.profit();
    let waste = node.waste();
    let bin_number_used = node.bin_number();
    let full = node.full();

    let solution = Solution {
        nodes,
        bin_roots,
        first_stage_orientations,
        item_number,
        profit,
        waste,
        bin_number: bin_number_used,
        full,
    };

    if !check(scheme, instance, &solution) {
        return None;
    }
    Some(solution)
}

/// Re-validates a reconstructed tree against the cut-length, defect and
/// item-copy constraints the generator was supposed to enforce on the fly.
#[must_use]
pub fn check(scheme: &crate::branching::BranchingScheme, instance: &Instance, solution: &Solution) -> bool {
    let mut copies_placed = vec![0u32; instance.item_type_number()];

    for n in &solution.nodes {
        let bin = instance.bin(n.bin);
        let o = solution.first_stage_orientations[n.bin];

        if !scheme.cut_through_defects() {
            for defect in &bin.defects {
                let l = instance.left(defect, o);
                let r = instance.right(defect, o);
                let b = instance.bottom(defect, o);
                let t = instance.top(defect, o);
                let cut_crosses = (n.l > l && n.l < r && n.b < t && n.t > b)
                    || (n.r > l && n.r < r && n.b < t && n.t > b)
                    || (n.b > b && n.b < t && n.l < r && n.r > l)
                    || (n.t > b && n.t < t && n.l < r && n.r > l);
                if cut_crosses {
                    return false;
                }
            }
        }

        match n.content {
            NodeContent::Item(j) => {
                copies_placed[j] += 1;
                if copies_placed[j] > instance.item(j).copies {
                    return false;
                }
                for defect in &bin.defects {
                    let l = instance.left(defect, o);
                    let r = instance.right(defect, o);
                    let b = instance.bottom(defect, o);
                    let t = instance.top(defect, o);
                    if n.l < r && n.r > l && n.b < t && n.t > b {
                        return false;
                    }
                }
            }
            NodeContent::Waste | NodeContent::Residual => {
                if n.width() < scheme.min_waste() || n.height() < scheme.min_waste() {
                    return false;
                }
            }
            NodeContent::Intermediate => {}
        }

        if n.depth == 0 {
            let w = instance.bin(n.bin).width(o);
            let h = instance.bin(n.bin).height(o);
            if n.l != 0 || n.r != w || n.b != 0 || n.t != h {
                return false;
            }
        } else if n.depth == 1 && !matches!(n.content, NodeContent::Waste | NodeContent::Residual) {
            if n.width() < scheme.min1cut() {
                return false;
            }
            if let Some(max1cut) = scheme.max1cut() {
                if n.width() > max1cut {
                    return false;
                }
            }
        } else if n.depth == 2 && !matches!(n.content, NodeContent::Waste | NodeContent::Residual) {
            if n.height() < scheme.min2cut() {
                return false;
            }
            if let Some(max2cut) = scheme.max2cut() {
                if n.height() > max2cut {
                    return false;
                }
            }
        }
    }

    true
}
