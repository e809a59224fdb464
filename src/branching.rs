//! Branching scheme: parameters, construction, children, and the
//! node-to-node dominance check used by the search driver.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::front;
use crate::instance::{Instance, ItemTypeId, Length, Objective, Orientation};
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutType1 {
    ThreeStaged,
    TwoStaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutType2 {
    Roadef2018,
    NonExact,
    Exact,
    Homogenous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstStageOrientationParam {
    Vertical,
    Horizontal,
    Any,
}

/// Tunable behavior of the branching scheme; the fields mirror the packing
/// parameters a caller would otherwise pass on a command line.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub cut_type_1: CutType1,
    pub cut_type_2: CutType2,
    pub first_stage_orientation: FirstStageOrientationParam,
    pub min1cut: Length,
    pub max1cut: Option<Length>,
    pub min2cut: Length,
    pub max2cut: Option<Length>,
    pub min_waste: Length,
    pub one2cut: bool,
    pub no_item_rotation: bool,
    pub cut_through_defects: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            cut_type_1: CutType1::ThreeStaged,
            cut_type_2: CutType2::NonExact,
            first_stage_orientation: FirstStageOrientationParam::Vertical,
            min1cut: 0,
            max1cut: None,
            min2cut: 0,
            max2cut: None,
            min_waste: 1,
            one2cut: false,
            no_item_rotation: false,
            cut_through_defects: false,
        }
    }
}

impl Parameters {
    /// Parses the four-character predefined branching scheme string used
    /// throughout the packing literature, e.g. `"3RVO"`: cut type 1
    /// (`3`/`2`), cut type 2 (`R`/`N`/`E`/`H`), first stage orientation
    /// (`V`/`H`/`A`), rotation flag (`R`/`O`).
    pub fn set_predefined(&mut self, s: &str) -> CoreResult<()> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 4 {
            return Err(CoreError::PredefinedStringLength(chars.len()));
        }

        self.cut_type_1 = match chars[0] {
            '3' => CutType1::ThreeStaged,
            '2' => CutType1::TwoStaged,
            c => return Err(CoreError::InvalidCutType1(c)),
        };

        self.cut_type_2 = match chars[1] {
            'R' => CutType2::Roadef2018,
            'N' => CutType2::NonExact,
            'E' => CutType2::Exact,
            'H' => CutType2::Homogenous,
            c => return Err(CoreError::InvalidCutType2(c)),
        };

        self.first_stage_orientation = match chars[2] {
            'V' => FirstStageOrientationParam::Vertical,
            'H' => FirstStageOrientationParam::Horizontal,
            'A' => FirstStageOrientationParam::Any,
            c => return Err(CoreError::InvalidFirstStageOrientation(c)),
        };

        self.no_item_rotation = match chars[3] {
            'R' => false,
            'O' => true,
            c => return Err(CoreError::InvalidRotationFlag(c)),
        };

        Ok(())
    }

    /// The ROADEF/EURO 2018 challenge preset.
    pub fn set_roadef2018(&mut self) {
        self.cut_type_1 = CutType1::ThreeStaged;
        self.cut_type_2 = CutType2::Roadef2018;
        self.first_stage_orientation = FirstStageOrientationParam::Vertical;
        self.min1cut = 100;
        self.max1cut = Some(3500);
        self.min2cut = 100;
        self.max2cut = None;
        self.min_waste = 20;
        self.one2cut = false;
        self.no_item_rotation = false;
        self.cut_through_defects = false;
    }
}

pub struct BranchingScheme {
    instance: Arc<Instance>,
    params: Parameters,
    no_oriented_items: bool,
}

impl BranchingScheme {
    pub fn new(instance: Arc<Instance>, mut params: Parameters) -> CoreResult<Arc<BranchingScheme>> {
        match instance.objective() {
            Objective::Default
            | Objective::Knapsack
            | Objective::BinPacking
            | Objective::BinPackingWithLeftovers
            | Objective::StripPackingWidth
            | Objective::StripPackingHeight => {}
        }

        if params.cut_type_1 == CutType1::TwoStaged {
            // Two-staged guillotine patterns run their single stage of cuts
            // across the axis the three-staged scheme uses for the second
            // stage, so the first-stage orientation flips.
            params.first_stage_orientation = match params.first_stage_orientation {
                FirstStageOrientationParam::Horizontal => FirstStageOrientationParam::Vertical,
                FirstStageOrientationParam::Vertical => FirstStageOrientationParam::Horizontal,
                FirstStageOrientationParam::Any => FirstStageOrientationParam::Any,
            };
        }

        let no_oriented_items = (0..instance_item_count(&instance)).all(|j| !instance.item(j).oriented);

        Ok(Arc::new(BranchingScheme {
            instance,
            params,
            no_oriented_items,
        }))
    }

    #[must_use]
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    #[must_use]
    pub fn cut_type_1(&self) -> CutType1 {
        self.params.cut_type_1
    }

    #[must_use]
    pub fn cut_type_2(&self) -> CutType2 {
        self.params.cut_type_2
    }

    #[must_use]
    pub fn first_stage_orientation_param(&self) -> FirstStageOrientationParam {
        self.params.first_stage_orientation
    }

    #[must_use]
    pub fn first_stage_orientation(&self) -> Orientation {
        match self.params.first_stage_orientation {
            FirstStageOrientationParam::Horizontal => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }

    #[must_use]
    pub fn min1cut(&self) -> Length {
        self.params.min1cut
    }

    #[must_use]
    pub fn max1cut(&self) -> Option<Length> {
        self.params.max1cut
    }

    #[must_use]
    pub fn min2cut(&self) -> Length {
        self.params.min2cut
    }

    #[must_use]
    pub fn max2cut(&self) -> Option<Length> {
        self.params.max2cut
    }

    #[must_use]
    pub fn min_waste(&self) -> Length {
        self.params.min_waste
    }

    #[must_use]
    pub fn one2cut(&self) -> bool {
        self.params.one2cut
    }

    #[must_use]
    pub fn cut_through_defects(&self) -> bool {
        self.params.cut_through_defects
    }

    #[must_use]
    pub fn no_oriented_items(&self) -> bool {
        self.no_oriented_items
    }

    #[must_use]
    pub fn oriented(&self, j: ItemTypeId) -> bool {
        self.params.no_item_rotation || self.instance.item(j).oriented
    }

    #[must_use]
    pub fn root(self: &Arc<Self>) -> Node {
        Node::root(self.clone())
    }

    #[must_use]
    pub fn children(self: &Arc<Self>, father: &Node) -> Vec<Node> {
        father.children().into_iter().map(|ins| Node::child(father, ins)).collect()
    }

    #[must_use]
    pub fn child(self: &Arc<Self>, father: &Node, insertion: crate::insertion::Insertion) -> Node {
        Node::child(father, insertion)
    }

    /// True when `n1` dominates `n2`: same items consumed per stack, `n2`
    /// didn't just close a defect (that waste can still shrink later), and
    /// `n1`'s front dominates `n2`'s.
    #[must_use]
    pub fn dominates(&self, n1: &Node, n2: &Node) -> bool {
        if n2.last_insertion_defect() {
            return false;
        }
        if n1.pos_stack_vec() != n2.pos_stack_vec() {
            return false;
        }
        front::dominates(&self.instance, &n1.front(), &n2.front())
    }
}

fn instance_item_count(instance: &Instance) -> usize {
    (0..instance.stack_number()).map(|s| instance.stack_size(s)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_roadef2018_string_parses() {
        let mut params = Parameters::default();
        params.set_predefined("3RVR").unwrap();
        assert_eq!(params.cut_type_1, CutType1::ThreeStaged);
        assert_eq!(params.cut_type_2, CutType2::Roadef2018);
        assert_eq!(params.first_stage_orientation, FirstStageOrientationParam::Vertical);
        assert!(!params.no_item_rotation);
    }

    #[test]
    fn predefined_string_wrong_length_is_rejected() {
        let mut params = Parameters::default();
        assert_eq!(params.set_predefined("3RV"), Err(CoreError::PredefinedStringLength(3)));
    }

    #[test]
    fn predefined_string_rejects_each_invalid_position() {
        let mut params = Parameters::default();
        assert_eq!(params.set_predefined("XRVR"), Err(CoreError::InvalidCutType1('X')));
        assert_eq!(params.set_predefined("3XVR"), Err(CoreError::InvalidCutType2('X')));
        assert_eq!(params.set_predefined("3RXR"), Err(CoreError::InvalidFirstStageOrientation('X')));
        assert_eq!(params.set_predefined("3RVX"), Err(CoreError::InvalidRotationFlag('X')));
    }

    #[test]
    fn roadef2018_preset_matches_published_constants() {
        let mut params = Parameters::default();
        params.set_roadef2018();
        assert_eq!(params.min1cut, 100);
        assert_eq!(params.max1cut, Some(3500));
        assert_eq!(params.min2cut, 100);
        assert_eq!(params.min_waste, 20);
        assert_eq!(params.cut_type_2, CutType2::Roadef2018);
    }
}
