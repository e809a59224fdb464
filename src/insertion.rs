//! Candidate moves produced by the insertion generator.

use crate::instance::{ItemTypeId, Length};

/// Depth of the father relative to the insertion being proposed.
///
/// This stays a plain signed integer (rather than a sum type) because the
/// generator and `update()` treat it as an ordinal that is compared,
/// decremented and used to index `x1_prev`/`y2_prev`/`x1_max` case tables;
/// see `DESIGN.md` for why the richer enum encoding was not adopted.
pub type Depth = i8;

/// New bin, first stage horizontal.
pub const DF_NEW_BIN_HORIZONTAL: Depth = -2;
/// New bin, first stage vertical.
pub const DF_NEW_BIN_VERTICAL: Depth = -1;
/// Same bin, new stage-1 strip.
pub const DF_NEW_STRIP: Depth = 0;
/// Same strip, new stage-2 subplate.
pub const DF_NEW_SUBPLATE: Depth = 1;
/// Same stage-2 subplate, new stage-3 subplate.
pub const DF_SAME_SUBPLATE: Depth = 2;

/// `z1`/`z2` enlargement-flag values carried by a cut coordinate: `0` means
/// the next enlargement of this cut must add at least `min_waste`, `1` means
/// the cut is waste-ended (can be enlarged by any amount), `2` means the cut
/// is frozen and cannot move at all. Kept as raw `u8` rather than an enum:
/// `update()`'s per-df case tables compare and fall through between these
/// the same way the upstream generator does, so the ordinal value itself is
/// load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Item at the bottom of the stage-3 subplate, or `None`.
    pub j1: Option<ItemTypeId>,
    /// Item stacked on top of `j1` (Roadef2018 only), or `None`.
    pub j2: Option<ItemTypeId>,
    pub df: Depth,
    pub x1: Length,
    pub y2: Length,
    pub x3: Length,
    pub x1_max: Length,
    pub y2_max: Length,
    pub z1: u8,
    pub z2: u8,
}

impl Insertion {
    #[must_use]
    pub fn is_defect_only(&self) -> bool {
        self.j1.is_none() && self.j2.is_none()
    }
}
