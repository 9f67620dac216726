//! Prioritized provider lookups.
//!
//! Some provider queries accept more than one spelling of the same subject.
//! Each spelling is a strategy; they are tried in order and the first
//! success wins. When all of them fail every failure is reported.

use log::debug;

use crate::ephemeris::EphemerisError;

pub struct LookupStrategy<'a, T> {
    pub label: &'static str,
    run: Box<dyn Fn() -> Result<T, EphemerisError> + 'a>,
}

impl<'a, T> LookupStrategy<'a, T> {
    pub fn new<F>(label: &'static str, run: F) -> Self
    where
        F: Fn() -> Result<T, EphemerisError> + 'a,
    {
        Self {
            label,
            run: Box::new(run),
        }
    }
}

/// Run `strategies` in order, returning the first success.
pub fn first_success<T>(
    subject: &str,
    strategies: &[LookupStrategy<'_, T>],
) -> Result<T, EphemerisError> {
    let mut failures = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        match (strategy.run)() {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("lookup '{}' via {} failed: {}", subject, strategy.label, e);
                failures.push(format!("{}: {}", strategy.label, e));
            }
        }
    }
    Err(EphemerisError::LookupExhausted {
        subject: subject.to_string(),
        failures,
    })
}
