//! Immutable problem data: items, stacks, bins and defects.
//!
//! Everything here is read-only after [`Instance::new`] returns. Geometry
//! queries take an explicit [`Orientation`] because the branching scheme
//! alternates which axis plays the role of "width" as it descends through
//! cut stages.

use fxhash::FxHashMap;

pub type Length = i64;
pub type Area = i64;
pub type Profit = i64;
pub type ItemTypeId = usize;
pub type StackId = usize;
pub type BinPos = usize;
pub type DefectId = usize;
pub type ItemPos = usize;

/// Which axis stage-1 cuts run along for a given bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    #[must_use]
    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }
}

/// The objective the search driver optimizes towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Objective {
    Default,
    Knapsack,
    BinPacking,
    BinPackingWithLeftovers,
    StripPackingWidth,
    StripPackingHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: ItemTypeId,
    pub stack: StackId,
    pub position_in_stack: ItemPos,
    pub w: Length,
    pub h: Length,
    pub profit: Profit,
    pub copies: u32,
    pub oriented: bool,
}

impl Item {
    #[must_use]
    pub fn area(&self) -> Area {
        self.w * self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defect {
    pub id: DefectId,
    pub x: Length,
    pub y: Length,
    pub w: Length,
    pub h: Length,
}

impl Defect {
    #[must_use]
    pub fn area(&self) -> Area {
        self.w * self.h
    }
}

#[derive(Debug, Clone)]
pub struct Bin {
    pub w: Length,
    pub h: Length,
    pub defects: Vec<Defect>,
}

impl Bin {
    #[must_use]
    pub fn width(&self, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => self.w,
            Orientation::Horizontal => self.h,
        }
    }

    #[must_use]
    pub fn height(&self, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => self.h,
            Orientation::Horizontal => self.w,
        }
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.w * self.h
    }
}

/// Canonical signature of a stack, used to find `stack_pred` in O(stacks)
/// instead of the naive pairwise O(stacks²) scan: stacks with an identical
/// signature are mutually `equals()` under the same rule the branching
/// scheme uses, so grouping by signature and remembering the last stack seen
/// per group recovers the same "nearest preceding equal stack" relation.
type StackSignature = Vec<(Length, Length, Profit, u32, bool)>;

fn stack_signature(items: &[Item]) -> StackSignature {
    items
        .iter()
        .map(|it| {
            if it.oriented {
                (it.w, it.h, it.profit, it.copies, true)
            } else {
                let (w, h) = if it.w <= it.h { (it.w, it.h) } else { (it.h, it.w) };
                (w, h, it.profit, it.copies, false)
            }
        })
        .collect()
}

pub struct Instance {
    items: Vec<Item>,
    stacks: Vec<Vec<ItemTypeId>>,
    bins: Vec<Bin>,
    objective: Objective,
    previous_bin_area: Vec<Area>,
    item_area: Area,
    item_profit: Profit,
    packable_area: Area,
    max_efficiency_item: Option<ItemTypeId>,
    stack_pred: Vec<Option<StackId>>,
}

impl Instance {
    #[must_use]
    pub fn new(items: Vec<Item>, stacks: Vec<Vec<ItemTypeId>>, bins: Vec<Bin>, objective: Objective) -> Self {
        let mut previous_bin_area = Vec::with_capacity(bins.len());
        let mut acc = 0;
        for bin in &bins {
            previous_bin_area.push(acc);
            acc += bin.area();
        }

        let item_area: Area = items.iter().map(|it| it.area() * Area::from(it.copies)).sum();
        let item_profit: Profit = items.iter().map(|it| it.profit * Profit::from(it.copies)).sum();
        let defect_area: Area = bins.iter().flat_map(|b| &b.defects).map(Defect::area).sum();
        let packable_area = acc - defect_area;

        let max_efficiency_item = items
            .iter()
            .filter(|it| it.area() > 0)
            .max_by(|a, b| {
                let ra = a.profit as f64 / a.area() as f64;
                let rb = b.profit as f64 / b.area() as f64;
                ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|it| it.id);

        let stack_pred = compute_stack_pred(&stacks, &items);

        Instance {
            items,
            stacks,
            bins,
            objective,
            previous_bin_area,
            item_area,
            item_profit,
            packable_area,
            max_efficiency_item,
            stack_pred,
        }
    }

    #[must_use]
    pub fn bin(&self, i: BinPos) -> &Bin {
        &self.bins[i]
    }

    #[must_use]
    pub fn bin_number(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn stack_number(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn item_type_number(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn stack_size(&self, s: StackId) -> ItemPos {
        self.stacks[s].len()
    }

    #[must_use]
    pub fn item(&self, j: ItemTypeId) -> &Item {
        &self.items[j]
    }

    #[must_use]
    pub fn item_in_stack(&self, s: StackId, k: ItemPos) -> &Item {
        &self.items[self.stacks[s][k]]
    }

    #[must_use]
    pub fn stack_pred(&self, s: StackId) -> Option<StackId> {
        self.stack_pred[s]
    }

    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    #[must_use]
    pub fn item_area(&self) -> Area {
        self.item_area
    }

    #[must_use]
    pub fn item_profit(&self) -> Profit {
        self.item_profit
    }

    #[must_use]
    pub fn packable_area(&self) -> Area {
        self.packable_area
    }

    #[must_use]
    pub fn max_efficiency_item(&self) -> Option<ItemTypeId> {
        self.max_efficiency_item
    }

    #[must_use]
    pub fn previous_bin_area(&self, i: BinPos) -> Area {
        self.previous_bin_area[i]
    }

    #[must_use]
    pub fn width(&self, item: &Item, rotated: bool, o: Orientation) -> Length {
        let (rw, rh) = if rotated { (item.h, item.w) } else { (item.w, item.h) };
        match o {
            Orientation::Vertical => rw,
            Orientation::Horizontal => rh,
        }
    }

    #[must_use]
    pub fn height(&self, item: &Item, rotated: bool, o: Orientation) -> Length {
        let (rw, rh) = if rotated { (item.h, item.w) } else { (item.w, item.h) };
        match o {
            Orientation::Vertical => rh,
            Orientation::Horizontal => rw,
        }
    }

    #[must_use]
    pub fn left(&self, d: &Defect, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => d.x,
            Orientation::Horizontal => d.y,
        }
    }

    #[must_use]
    pub fn right(&self, d: &Defect, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => d.x + d.w,
            Orientation::Horizontal => d.y + d.h,
        }
    }

    #[must_use]
    pub fn bottom(&self, d: &Defect, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => d.y,
            Orientation::Horizontal => d.x,
        }
    }

    #[must_use]
    pub fn top(&self, d: &Defect, o: Orientation) -> Length {
        match o {
            Orientation::Vertical => d.y + d.h,
            Orientation::Horizontal => d.x + d.w,
        }
    }

    #[must_use]
    pub fn defect(&self, k: DefectId) -> &Defect {
        &self.bin_of_defect(k).1
    }

    fn bin_of_defect(&self, k: DefectId) -> (BinPos, &Defect) {
        // Defect ids are unique across the whole instance; scan bins in
        // order. Instances have few enough defects in practice that this
        // linear probe is not worth indexing.
        let mut remaining = k;
        for (i, bin) in self.bins.iter().enumerate() {
            if remaining < bin.defects.len() {
                return (i, &bin.defects[remaining]);
            }
            remaining -= bin.defects.len();
        }
        panic!("unknown defect id {k}");
    }

    #[must_use]
    pub fn rect_intersects_defect(&self, l: Length, r: Length, b: Length, t: Length, i: BinPos, o: Orientation) -> Option<DefectId> {
        self.bin(i)
            .defects
            .iter()
            .find(|d| l < self.right(d, o) && r > self.left(d, o) && b < self.top(d, o) && t > self.bottom(d, o))
            .map(|d| d.id)
    }

    #[must_use]
    pub fn item_intersects_defect(&self, x: Length, y: Length, item: &Item, rotated: bool, i: BinPos, o: Orientation) -> Option<DefectId> {
        let w = self.width(item, rotated, o);
        let h = self.height(item, rotated, o);
        self.rect_intersects_defect(x, x + w, y, y + h, i, o)
    }

    #[must_use]
    pub fn x_intersects_defect(&self, x: Length, i: BinPos, o: Orientation) -> Option<DefectId> {
        self.bin(i)
            .defects
            .iter()
            .find(|d| self.left(d, o) < x && x < self.right(d, o))
            .map(|d| d.id)
    }

    #[must_use]
    pub fn y_intersects_defect(&self, x_lo: Length, x_hi: Length, y: Length, i: BinPos, o: Orientation) -> Option<DefectId> {
        self.bin(i)
            .defects
            .iter()
            .find(|d| self.bottom(d, o) < y && y < self.top(d, o) && self.left(d, o) < x_hi && self.right(d, o) > x_lo)
            .map(|d| d.id)
    }
}

fn compute_stack_pred(stacks: &[Vec<ItemTypeId>], items: &[Item]) -> Vec<Option<StackId>> {
    let mut last_seen: FxHashMap<StackSignature, StackId> = FxHashMap::default();
    let mut pred = vec![None; stacks.len()];
    for (s, stack) in stacks.iter().enumerate() {
        let items_in_stack: Vec<Item> = stack.iter().map(|&id| items[id]).collect();
        let sig = stack_signature(&items_in_stack);
        if let Some(&s0) = last_seen.get(&sig) {
            pred[s] = Some(s0);
        }
        last_seen.insert(sig, s);
    }
    pred
}
