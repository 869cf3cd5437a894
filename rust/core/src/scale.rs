// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scale factor with a one-way manual latch

use crate::config::ArConfig;
use crate::error::{Error, Result};

/// `clamp(target / diagonal, min, max)`. A missing or degenerate diagonal counts as 1.
pub fn auto_scale(diagonal: Option<f64>, target: f64, min: f64, max: f64) -> f64 {
    let d = match diagonal {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 1.0,
    };
    (target / d).clamp(min, max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Source {
    Auto,
    Manual(f64),
}

/// Current anchor scale. Auto until the user touches the control, then manual until reset.
#[derive(Debug, Clone)]
pub struct ScaleFactor {
    target: f64,
    min: f64,
    max: f64,
    source: Source,
    last_auto: Option<f64>,
}

impl ScaleFactor {
    pub fn new(config: &ArConfig) -> Self {
        Self {
            target: config.target_diagonal,
            min: config.min_scale,
            max: config.max_scale,
            source: Source::Auto,
            last_auto: None,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, Source::Manual(_))
    }

    /// Scale to apply for a model with `diagonal`
    pub fn resolve(&mut self, diagonal: Option<f64>) -> f64 {
        match self.source {
            Source::Manual(s) => s,
            Source::Auto => {
                let s = auto_scale(diagonal, self.target, self.min, self.max);
                self.last_auto = Some(s);
                s
            }
        }
    }

    /// Last resolved value, if any
    pub fn current(&self) -> Option<f64> {
        match self.source {
            Source::Manual(s) => Some(s),
            Source::Auto => self.last_auto,
        }
    }

    /// User input. Kept exactly as given and latched.
    pub fn set_manual(&mut self, value: f64) -> Result<f64> {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidScale(value));
        }
        self.source = Source::Manual(value);
        Ok(value)
    }

    /// Multiply the current value (pinch/wheel). Latches manual.
    pub fn multiply(&mut self, factor: f64) -> Result<f64> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidScale(factor));
        }
        let base = self.current().unwrap_or(1.0);
        self.set_manual((base * factor).clamp(self.min, self.max))
    }

    pub fn reset(&mut self) {
        self.source = Source::Auto;
        self.last_auto = None;
    }
}
