//! Trailing stop with ratchet enforcement.
//!
//! **Core Rule:** A trailing stop may tighten, never loosen.
//!
//! A pullback or a wider trailing distance can only ever propose a looser
//! level, and the ratchet discards it.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Per-position trailing stop.
///
/// - Long positions: level can only rise
/// - Short positions: level can only fall
/// - Disabled stops never take a level and never trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Current level; `None` until the first favorable move arms it.
    level: Option<f64>,

    side: Side,

    enabled: bool,
}

impl TrailingStop {
    pub fn new(side: Side) -> Self {
        Self {
            level: None,
            side,
            enabled: true,
        }
    }

    pub fn with_initial_level(side: Side, initial_level: f64) -> Self {
        Self {
            level: Some(initial_level),
            side,
            enabled: true,
        }
    }

    pub fn disabled(side: Side) -> Self {
        Self {
            level: None,
            side,
            enabled: false,
        }
    }

    /// Offer a new level. Returns true if the stop moved.
    ///
    /// # Rules
    /// - Disabled: ignored
    /// - No level yet: adopted
    /// - Long: adopted only if higher than the current level
    /// - Short: adopted only if lower than the current level
    ///
    /// # Example
    /// ```
    /// use scout_core::domain::Side;
    /// use scout_core::risk::TrailingStop;
    ///
    /// let mut stop = TrailingStop::with_initial_level(Side::Buy, 95.0);
    ///
    /// // Tightening: $95 → $100 (allowed)
    /// assert!(stop.apply(100.0));
    ///
    /// // Loosening: $100 → $90 (blocked, stays at $100)
    /// assert!(!stop.apply(90.0));
    /// assert_eq!(stop.level(), Some(100.0));
    /// ```
    pub fn apply(&mut self, proposed: f64) -> bool {
        if !self.enabled || !proposed.is_finite() {
            return false;
        }

        let tighter = match self.level {
            None => true,
            Some(current) => match self.side {
                Side::Buy => proposed > current,
                Side::Sell => proposed < current,
            },
        };
        if tighter {
            self.level = Some(proposed);
        }
        tighter
    }

    /// True when an armed, enabled stop has been crossed by `price`.
    pub fn is_hit(&self, price: f64) -> bool {
        match (self.enabled, self.level) {
            (true, Some(level)) => match self.side {
                Side::Buy => price <= level,
                Side::Sell => price >= level,
            },
            _ => false,
        }
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
