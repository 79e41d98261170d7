//! Ordered threshold cascades.
//!
//! A cascade maps a metric value to a categorical label through an ordered
//! list of `(upper bound, label)` brackets scanned top to bottom, first
//! match wins, with a terminal label for everything above the last bound.
//! Bounds are exclusive: a value exactly at a boundary selects the next
//! bracket. Keeping cascades as data keeps the bracket boundaries
//! auditable and testable in isolation.

/// A total, mutually exclusive mapping from a real value to a label.
#[derive(Debug, Clone, Copy)]
pub struct Cascade<'a> {
    /// `(exclusive upper bound, label)` pairs in strictly ascending bound order.
    brackets: &'a [(f64, &'a str)],
    /// Label for values at or above the last bound.
    otherwise: &'a str,
}

impl<'a> Cascade<'a> {
    pub const fn new(brackets: &'a [(f64, &'a str)], otherwise: &'a str) -> Self {
        Self { brackets, otherwise }
    }

    /// First bracket whose upper bound exceeds `value`, else the terminal label.
    pub fn select(&self, value: f64) -> &'a str {
        for &(upper, label) in self.brackets {
            if value < upper {
                return label;
            }
        }
        self.otherwise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: Cascade<'static> = Cascade::new(
        &[(0.85, "broad"), (0.90, "round"), (0.95, "oval"), (1.00, "long")],
        "very long",
    );

    #[test]
    fn test_first_match_wins() {
        assert_eq!(FACE.select(0.5), "broad");
        assert_eq!(FACE.select(0.87), "round");
        assert_eq!(FACE.select(0.92), "oval");
        assert_eq!(FACE.select(0.99), "long");
        assert_eq!(FACE.select(1.5), "very long");
    }

    #[test]
    fn test_boundary_selects_next_bracket() {
        // Exclusive upper bounds: a value exactly at a boundary belongs to
        // the following bracket.
        assert_eq!(FACE.select(0.85), "round");
        assert_eq!(FACE.select(0.90), "oval");
        assert_eq!(FACE.select(0.95), "long");
        assert_eq!(FACE.select(1.00), "very long");
    }

    #[test]
    fn test_total_over_sampled_range() {
        // Every sampled value maps to exactly one known label.
        let labels = ["broad", "round", "oval", "long", "very long"];
        let mut i = 0;
        while i <= 200 {
            let value = i as f64 / 100.0;
            assert!(labels.contains(&FACE.select(value)), "value {value}");
            i += 1;
        }
    }

    #[test]
    fn test_empty_brackets_fall_through() {
        let c = Cascade::new(&[], "only");
        assert_eq!(c.select(f64::MIN), "only");
        assert_eq!(c.select(f64::MAX), "only");
    }
}
