//! Boolean status effects recognised from narration.
//!
//! The parser only records that an onset or clearance line was seen
//! (`status.sleeping = 1|0`). Whether an effect is active right now is
//! decided by the game's effect timers, reached through [`EffectTimers`].

use std::collections::HashMap;
use std::time::Instant;

use crate::keys;

/// An effect whose onset and clearance show up as narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusEffect {
    /// Magical or natural sleep.
    Sleep,
    /// Bound in place.
    Bind,
    /// Unable to speak or cast.
    Silence,
    /// Calmed; cannot attack.
    Calm,
    /// Throat cut; cannot speak.
    Cutthroat,
}

impl StatusEffect {
    /// All tracked effects.
    pub const ALL: [Self; 5] = [
        Self::Sleep,
        Self::Bind,
        Self::Silence,
        Self::Calm,
        Self::Cutthroat,
    ];

    /// Fact key of the companion boolean.
    #[must_use]
    pub fn fact_key(self) -> String {
        keys::status(match self {
            Self::Sleep => "sleeping",
            Self::Bind => "bound",
            Self::Silence => "silenced",
            Self::Calm => "calmed",
            Self::Cutthroat => "cutthroat",
        })
    }

    /// Name under which the effect timer registry tracks it.
    #[must_use]
    pub fn effect_name(self) -> &'static str {
        match self {
            Self::Sleep => "Sleep",
            Self::Bind => "Bind",
            Self::Silence => "Silenced",
            Self::Calm => "Calm",
            Self::Cutthroat => "Major Bleed",
        }
    }

    /// Whether the effect leaves the character unable to act.
    #[must_use]
    pub fn incapacitates(self) -> bool {
        matches!(self, Self::Sleep | Self::Bind)
    }
}

/// Lookup into the game's active-effect timers.
pub trait EffectTimers {
    /// Whether an effect with this name has not yet expired.
    fn active(&self, effect_name: &str) -> bool;
}

/// Whether `effect` is active according to the timer registry.
pub fn is_active(effect: StatusEffect, timers: &dyn EffectTimers) -> bool {
    timers.active(effect.effect_name())
}

/// Whether any incapacitating effect is active.
pub fn incapacitated(timers: &dyn EffectTimers) -> bool {
    StatusEffect::ALL
        .into_iter()
        .filter(|effect| effect.incapacitates())
        .any(|effect| is_active(effect, timers))
}

/// A simple expiry map, enough for tests and offline tools.
#[derive(Debug, Default, Clone)]
pub struct ExpiryTable {
    expiries: HashMap<String, Instant>,
}

impl ExpiryTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `effect_name` lasts until `until`.
    pub fn insert(&mut self, effect_name: impl Into<String>, until: Instant) {
        self.expiries.insert(effect_name.into(), until);
    }
}

impl EffectTimers for ExpiryTable {
    fn active(&self, effect_name: &str) -> bool {
        self.expiries
            .get(effect_name)
            .is_some_and(|until| *until > Instant::now())
    }
}
