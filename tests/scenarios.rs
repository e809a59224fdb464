//! End-to-end insertion-generator scenarios, transcribed from the upstream
//! `defect_test.cpp` fixtures (the authoritative oracle this generator was
//! ported from) rather than hand-derived, to keep the expected values
//! trustworthy without ever compiling and running this crate.

use rectguillotine::branching::{BranchingScheme, Parameters};
use rectguillotine::instance::{Bin, Defect, Instance, Item, Objective};
use rectguillotine::insertion::Insertion;
use rectguillotine::solution;
use std::sync::Arc;

fn item(id: usize, w: i64, h: i64) -> Item {
    Item {
        id,
        stack: 0,
        position_in_stack: id,
        w,
        h,
        profit: 0,
        copies: 1,
        oriented: false,
    }
}

fn defect(id: usize, x: i64, y: i64, w: i64, h: i64) -> Defect {
    Defect { id, x, y, w, h }
}

fn scheme(items: Vec<Item>, defects: Vec<Defect>) -> Arc<BranchingScheme> {
    let stack: Vec<usize> = (0..items.len()).collect();
    let bins = vec![Bin {
        w: 6000,
        h: 3210,
        defects,
    }];
    let instance = Arc::new(Instance::new(items, vec![stack], bins, Objective::BinPackingWithLeftovers));
    let mut params = Parameters::default();
    params.set_roadef2018();
    BranchingScheme::new(instance, params).unwrap()
}

fn sorted(mut v: Vec<Insertion>) -> Vec<Insertion> {
    v.sort_by_key(|i| (i.j1, i.j2, i.df, i.x1, i.y2, i.x3, i.x1_max, i.y2_max, i.z1, i.z2));
    v
}

fn assert_same_insertions(actual: Vec<Insertion>, expected: Vec<Insertion>) {
    assert_eq!(sorted(actual), sorted(expected));
}

fn ins(j1: Option<usize>, j2: Option<usize>, df: i8, x1: i64, y2: i64, x3: i64, x1_max: i64, y2_max: i64, z1: u8, z2: u8) -> Insertion {
    Insertion { j1, j2, df, x1, y2, x3, x1_max, y2_max, z1, z2 }
}

/// S1: a single rotatable 500x1000 item in an empty 6000x3210 bin yields
/// exactly the two orientation choices.
#[test_log::test]
fn s1_single_rotatable_item_no_defects() {
    let scheme = scheme(vec![item(0, 500, 1000)], vec![]);
    let root = scheme.root();
    assert_same_insertions(
        scheme.children(&root).into_iter().map(|n| *n.insertion()).collect(),
        vec![
            ins(Some(0), None, -1, 1000, 500, 1000, 3500, 3210, 0, 0),
            ins(Some(0), None, -1, 500, 1000, 500, 3500, 3210, 0, 0),
        ],
    );
}

/// S2: a small defect just above item 0's corner forces a "j2 above defect"
/// insertion alongside the clean placement and a pure-defect insertion.
#[test_log::test]
fn s2_small_defect_forces_above_defect_insertion() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 700, 1000), item(2, 1700, 2000)], vec![defect(0, 500, 248, 2, 2)]);
    let root = scheme.root();
    assert_same_insertions(
        scheme.children(&root).into_iter().map(|n| *n.insertion()).collect(),
        vec![
            ins(None, Some(0), -1, 1000, 750, 1000, 3500, 3210, 0, 1),
            ins(Some(0), None, -1, 500, 1000, 500, 3500, 3210, 0, 0),
            ins(None, None, -1, 502, 250, 502, 3500, 3210, 1, 1),
        ],
    );
}

/// S3: a defect at (995,900) forces `y2_max = 900` on the item-0 insertion
/// so the later stage-3 cut can't cross it.
#[test_log::test]
fn s3_defect_caps_y2_max_on_the_root_insertion() {
    let scheme = scheme(vec![item(0, 1000, 500), item(1, 1010, 400), item(2, 1020, 1000)], vec![defect(0, 995, 900, 10, 10)]);
    let root = scheme.root();
    assert_same_insertions(
        scheme.children(&root).into_iter().map(|n| *n.insertion()).collect(),
        vec![
            ins(Some(0), None, -1, 1020, 500, 1000, 3500, 900, 1, 0),
            ins(Some(0), None, -1, 500, 1000, 500, 3500, 3210, 0, 0),
            ins(None, None, -1, 1005, 910, 1005, 3500, 3210, 1, 1),
        ],
    );
}

/// S4: once item 0 occupies the first strip, a defect further right forces
/// `x1_max = 2000` on every continuation insertion for item 1.
#[test_log::test]
fn s4_defect_caps_x1_max_on_a_strip_continuation() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 510, 1500), item(2, 520, 2500)], vec![defect(0, 2000, 495, 10, 10)]);
    let root = scheme.root();
    let i0 = ins(Some(0), None, -1, 1000, 500, 1000, 3500, 3210, 0, 0);
    assert!(scheme.children(&root).iter().any(|n| *n.insertion() == i0));
    let node_1 = scheme.child(&root, i0);

    assert_same_insertions(
        scheme.children(&node_1).into_iter().map(|n| *n.insertion()).collect(),
        vec![
            ins(None, None, 2, 2010, 520, 2010, 3500, 3210, 1, 1),
            ins(Some(1), None, 1, 1500, 1010, 1500, 2000, 3210, 0, 0),
            ins(Some(1), None, 1, 1000, 2000, 510, 2000, 3210, 0, 0),
        ],
    );
}

/// S5: a 10x10 defect just past item 0's top edge pushes item 1's strip
/// continuation to `y2 = 2005` through the min-waste halo.
#[test_log::test]
fn s5_defect_past_the_top_edge_pushes_the_next_strip() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 1000, 1000), item(2, 200, 3180)], vec![defect(0, 500, 995, 10, 10)]);
    let root = scheme.root();
    let i0 = ins(Some(0), None, -1, 1000, 500, 1000, 3500, 3210, 0, 0);
    assert!(scheme.children(&root).iter().any(|n| *n.insertion() == i0));
    let node_1 = scheme.child(&root, i0);

    assert_same_insertions(
        scheme.children(&node_1).into_iter().map(|n| *n.insertion()).collect(),
        vec![
            ins(Some(1), None, 2, 2000, 1020, 2000, 3500, 3210, 0, 1),
            ins(None, Some(1), 1, 1000, 2005, 1000, 3500, 3210, 0, 1),
            ins(None, None, 1, 1000, 1005, 510, 3500, 3210, 0, 1),
        ],
    );
}

/// S6: a defect right where two equal-width items would stack forces the
/// two-item insertion's `z2` to come back frozen.
#[test_log::test]
fn s6_two_item_insertion_freezes_z2_near_a_defect() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 500, 1000), item(2, 500, 1500)], vec![defect(0, 1250, 748, 2, 2)]);
    let root = scheme.root();
    let i0 = ins(Some(0), Some(1), -1, 1000, 1000, 1000, 3500, 3210, 0, 2);
    assert!(scheme.children(&root).iter().any(|n| *n.insertion() == i0));
}

/// Universal invariants from the generator: waste is never negative and the
/// area bookkeeping matches the documented formula, for every child reached
/// two levels deep from an instance with an active defect.
#[test_log::test]
fn generated_nodes_never_carry_negative_waste() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 700, 1000), item(2, 1700, 2000)], vec![defect(0, 500, 248, 2, 2)]);
    let root = scheme.root();
    for first in scheme.children(&root) {
        assert!(first.waste() >= 0);
        assert!(first.pos_stack(0) <= scheme.instance().stack_size(0));
        for second in scheme.children(&first) {
            assert!(second.waste() >= 0);
            assert!(second.pos_stack(0) <= scheme.instance().stack_size(0));
        }
    }
}

/// Repeated calls to `children()` return the same set of candidates.
#[test_log::test]
fn children_generation_is_deterministic() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 700, 1000), item(2, 1700, 2000)], vec![defect(0, 500, 248, 2, 2)]);
    let root = scheme.root();
    assert_eq!(root.children(), root.children());
}

/// Every insertion `children(node)` emits converts to a solution tree that
/// `check()` accepts, for a fully placed single-item instance.
#[test_log::test]
fn every_emitted_insertion_converts_to_a_checked_solution() {
    let scheme = scheme(vec![item(0, 500, 1000), item(1, 700, 1000), item(2, 1700, 2000)], vec![defect(0, 500, 248, 2, 2)]);
    let root = scheme.root();
    for insertion in root.children() {
        let child = scheme.child(&root, insertion);
        let solution = solution::convert(&child).expect("a generator-emitted insertion must convert to a checked solution");
        assert_eq!(solution.item_number, child.item_number());
        assert_eq!(solution.waste, child.waste());
    }
}
