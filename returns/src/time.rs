//! Time-interval conventions used to annualize or re-scale a metric.
//!
//! Each interval type knows only its own wall-clock length; [`SharpeRatio::scale`](crate::metric::sharpe::SharpeRatio::scale)
//! uses that to convert a ratio computed over one interval to another,
//! assuming IID returns.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

pub trait TimeInterval: Copy {
    fn interval(&self) -> TimeDelta;
}

impl TimeInterval for TimeDelta {
    fn interval(&self) -> TimeDelta {
        *self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Daily;

impl TimeInterval for Daily {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(1)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Annual252;

impl TimeInterval for Annual252 {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(252)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Annual365;

impl TimeInterval for Annual365 {
    fn interval(&self) -> TimeDelta {
        TimeDelta::days(365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_252_is_252_days() {
        assert_eq!(Annual252.interval(), TimeDelta::days(252));
    }
}
