//! Cache Datum Module
//!
//! Defines the structure for individual stored entries and their age checks.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Datum ==
/// A stored value plus the time it was last (re)set.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum<V> {
    /// The stored value
    pub value: V,
    /// When the value was last set; drives both expiry and eviction order
    pub set_time: DateTime<Utc>,
}

impl<V> Datum<V> {
    // == Constructor ==
    /// Creates a datum stamped with the current time.
    pub fn new(value: V) -> Self {
        Self::with_set_time(value, Utc::now())
    }

    /// Creates a datum with an explicit timestamp.
    pub fn with_set_time(value: V, set_time: DateTime<Utc>) -> Self {
        Self { value, set_time }
    }

    // == Touch ==
    /// Refreshes the timestamp to now.
    pub fn touch(&mut self) {
        self.set_time = Utc::now();
    }

    // == Is Unset ==
    /// Returns true if the timestamp was never set.
    ///
    /// An unset timestamp (the Unix epoch, `DateTime::default()`) sorts as
    /// the oldest possible entry.
    pub fn is_unset(&self) -> bool {
        self.set_time == DateTime::<Utc>::default()
    }

    // == Is Expired ==
    /// Checks whether the datum has reached `expiry` at time `now`.
    ///
    /// Boundary condition: an age equal to the expiry counts as expired.
    /// A zero expiry disables the check. A timestamp in the future is never
    /// expired.
    pub fn is_expired(&self, expiry: Duration, now: DateTime<Utc>) -> bool {
        if expiry.is_zero() {
            return false;
        }
        (now - self.set_time)
            .to_std()
            .map(|age| age >= expiry)
            .unwrap_or(false)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_datum_creation() {
        let before = Utc::now();
        let datum = Datum::new("value");
        assert_eq!(datum.value, "value");
        assert!(datum.set_time >= before);
        assert!(!datum.is_unset());
    }

    #[test]
    fn test_datum_unset() {
        let datum = Datum::with_set_time(1, DateTime::<Utc>::default());
        assert!(datum.is_unset());
    }

    #[test]
    fn test_datum_touch_moves_forward() {
        let old = Utc::now() - TimeDelta::seconds(30);
        let mut datum = Datum::with_set_time(1, old);
        datum.touch();
        assert!(datum.set_time > old);
    }

    #[test]
    fn test_expiry_disabled() {
        let datum = Datum::with_set_time(1, DateTime::<Utc>::default());
        assert!(!datum.is_expired(Duration::ZERO, Utc::now()));
    }

    #[test]
    fn test_expiry_boundary_condition() {
        let now = Utc::now();
        let datum = Datum::with_set_time(1, now - TimeDelta::seconds(5));

        assert!(datum.is_expired(Duration::from_secs(5), now));
        assert!(datum.is_expired(Duration::from_secs(4), now));
        assert!(!datum.is_expired(Duration::from_secs(6), now));
    }

    #[test]
    fn test_future_set_time_never_expired() {
        let now = Utc::now();
        let datum = Datum::with_set_time(1, now + TimeDelta::seconds(60));
        assert!(!datum.is_expired(Duration::from_nanos(1), now));
    }
}
