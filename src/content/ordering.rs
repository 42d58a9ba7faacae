//! Display ordering for list content.
//!
//! Lists are sorted by the store on `order`; this module only assigns the
//! position of new items.

/// Display order given to a newly created item: one past the current count.
pub fn next_order(current_count: usize) -> f64 {
    current_count as f64 + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_order_is_count_plus_one() {
        assert_eq!(next_order(0), 1.0);
        assert_eq!(next_order(4), 5.0);
    }
}
