//! Style layers and per-character style bitmasks.
//!
//! Every character carries a [`StyleMask`]: bit `n` means "render with the style stored in
//! slot `n` of the document's [`StyleTable`]". The table has a fixed number of slots
//! (16 or 32, see [`MaskWidth`]); running out of slots is reported as
//! [`EditError::CapacityExceeded`] instead of wrapping around.

use crate::error::{EditError, EditResult};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::sync::Arc;

/// Number of usable bits in a style mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaskWidth {
    /// 16 style layers.
    Sixteen,
    /// 32 style layers.
    #[default]
    ThirtyTwo,
}

impl MaskWidth {
    /// Number of style slots.
    pub const fn capacity(self) -> usize {
        match self {
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }

    /// Mask with every usable bit set.
    pub const fn full_mask(self) -> StyleMask {
        match self {
            Self::Sixteen => StyleMask(0xFFFF),
            Self::ThirtyTwo => StyleMask(u32::MAX),
        }
    }
}

/// Set of style layers applied to one character.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleMask(pub u32);

impl StyleMask {
    /// No style.
    pub const NONE: Self = Self(0);

    /// Mask with only the bit of `slot` set.
    pub const fn from_slot(slot: usize) -> Self {
        Self(1u32 << slot)
    }

    /// Returns `true` if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate over the slot indices of the set bits.
    pub fn slots(self) -> impl Iterator<Item = usize> {
        (0..32).filter(move |bit| self.0 & (1u32 << bit) != 0)
    }
}

impl fmt::Debug for StyleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StyleMask({:#b})", self.0)
    }
}

impl BitOr for StyleMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StyleMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for StyleMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for StyleMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// A style layer registered by a host (highlighter, search marker, read-only region...).
///
/// The engine never renders anything; it only needs the identity of a style and whether
/// characters carrying it may be edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    /// Human readable name (e.g. `"keyword"`).
    pub name: String,
    /// Foreground color as `0xRRGGBBAA`, if the layer sets one.
    pub foreground: Option<u32>,
    /// Background color as `0xRRGGBBAA`, if the layer sets one.
    pub background: Option<u32>,
    /// Characters carrying this style cannot be edited.
    pub read_only: bool,
}

impl Style {
    /// Create a named style with no colors.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a style that marks characters as read-only.
    pub fn read_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: true,
            ..Self::default()
        }
    }
}

/// Fixed-capacity table mapping slot index to style.
#[derive(Debug, Clone)]
pub struct StyleTable {
    width: MaskWidth,
    slots: Vec<Option<Arc<Style>>>,
}

impl StyleTable {
    /// Create an empty table with the given width.
    pub fn new(width: MaskWidth) -> Self {
        Self {
            width,
            slots: vec![None; width.capacity()],
        }
    }

    /// Mask width of this table.
    pub fn width(&self) -> MaskWidth {
        self.width
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Register a style and return its slot.
    ///
    /// A style already present in the table (same `Arc`) keeps its slot; otherwise the first
    /// free slot is used.
    pub fn add_style(&mut self, style: Arc<Style>) -> EditResult<usize> {
        if let Some(slot) = self.slot_of(&style) {
            return Ok(slot);
        }

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return Err(EditError::CapacityExceeded {
                capacity: self.capacity(),
            });
        };
        self.slots[slot] = Some(style);
        Ok(slot)
    }

    /// Slot of a registered style (compared by pointer identity).
    pub fn slot_of(&self, style: &Arc<Style>) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| Arc::ptr_eq(s, style)))
    }

    /// Mask for a registered style.
    pub fn mask_of(&self, style: &Arc<Style>) -> Option<StyleMask> {
        self.slot_of(style).map(StyleMask::from_slot)
    }

    /// Style stored in `slot`.
    pub fn get(&self, slot: usize) -> Option<&Arc<Style>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Free a slot. Characters still carrying its bit simply render without it.
    pub fn remove(&mut self, slot: usize) -> Option<Arc<Style>> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Drop every registered style.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Mask of every populated slot.
    pub fn populated_mask(&self) -> StyleMask {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .fold(StyleMask::NONE, |mask, (slot, _)| {
                mask | StyleMask::from_slot(slot)
            })
    }

    /// Mask of every populated slot whose style is read-only.
    pub fn read_only_mask(&self) -> StyleMask {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.read_only))
            .fold(StyleMask::NONE, |mask, (slot, _)| {
                mask | StyleMask::from_slot(slot)
            })
    }

    /// Check that `mask` only references populated slots.
    pub fn validate(&self, mask: StyleMask) -> EditResult<()> {
        let unknown = mask & !self.populated_mask();
        match unknown.slots().next() {
            Some(slot) => Err(EditError::UnknownStyleSlot(slot)),
            None => Ok(()),
        }
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new(MaskWidth::default())
    }
}
