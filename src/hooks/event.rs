use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// One of the eight dispatch points. The discriminant is the bit position in
/// the registration mask; external tooling depends on this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HookEvent {
    BeforeSetRecord = 0,
    AfterSetRecord = 1,
    BeforeSpliceStaticData = 2,
    AfterSpliceStaticData = 3,
    BeforeSpliceDynamicData = 4,
    AfterSpliceDynamicData = 5,
    BeforeDeleteRecord = 6,
    AfterDeleteRecord = 7,
}

impl HookEvent {
    pub const ALL: [HookEvent; 8] = [
        HookEvent::BeforeSetRecord,
        HookEvent::AfterSetRecord,
        HookEvent::BeforeSpliceStaticData,
        HookEvent::AfterSpliceStaticData,
        HookEvent::BeforeSpliceDynamicData,
        HookEvent::AfterSpliceDynamicData,
        HookEvent::BeforeDeleteRecord,
        HookEvent::AfterDeleteRecord,
    ];

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    #[inline]
    pub const fn is_before(self) -> bool {
        (self as u8) % 2 == 0
    }
}

/// Set of [`HookEvent`]s an observer is registered for.
///
/// Stored as the 8-bit wire mask: bit `n` is the event with discriminant `n`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HookMask(u8);

impl HookMask {
    pub const NONE: HookMask = HookMask(0);
    pub const ALL: HookMask = HookMask(0xFF);
    pub const BEFORE_ALL: HookMask = HookMask(0b0101_0101);
    pub const AFTER_ALL: HookMask = HookMask(0b1010_1010);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        HookMask(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, event: HookEvent) -> bool {
        self.0 & event.bit() != 0
    }

    #[inline]
    pub const fn with(self, event: HookEvent) -> Self {
        HookMask(self.0 | event.bit())
    }

    #[inline]
    pub const fn without(self, event: HookEvent) -> Self {
        HookMask(self.0 & !event.bit())
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = HookEvent> {
        HookEvent::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl fmt::Debug for HookMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<HookEvent> for HookMask {
    fn from(event: HookEvent) -> Self {
        HookMask(event.bit())
    }
}

impl FromIterator<HookEvent> for HookMask {
    fn from_iter<I: IntoIterator<Item = HookEvent>>(iter: I) -> Self {
        iter.into_iter().fold(HookMask::NONE, HookMask::with)
    }
}

impl BitOr for HookMask {
    type Output = HookMask;
    fn bitor(self, rhs: HookMask) -> HookMask {
        HookMask(self.0 | rhs.0)
    }
}

impl BitOr<HookEvent> for HookMask {
    type Output = HookMask;
    fn bitor(self, rhs: HookEvent) -> HookMask {
        self.with(rhs)
    }
}

impl BitOr for HookEvent {
    type Output = HookMask;
    fn bitor(self, rhs: HookEvent) -> HookMask {
        HookMask::from(self).with(rhs)
    }
}
