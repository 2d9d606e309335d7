/// Move a wrapping list index one item up. An empty list stays at 0.
pub fn wrap_prev(selected: u8, item_count: u8) -> u8 {
    if item_count == 0 {
        return 0;
    }
    let (selected, count) = (u16::from(selected), u16::from(item_count));
    ((selected % count + count - 1) % count) as u8
}

/// Move a wrapping list index one item down. An empty list stays at 0.
pub fn wrap_next(selected: u8, item_count: u8) -> u8 {
    if item_count == 0 {
        return 0;
    }
    let (selected, count) = (u16::from(selected), u16::from(item_count));
    ((selected % count + 1) % count) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_to_start() {
        assert_eq!(wrap_next(0, 7), 1);
        assert_eq!(wrap_next(6, 7), 0);
    }

    #[test]
    fn prev_wraps_to_end() {
        assert_eq!(wrap_prev(0, 7), 6);
        assert_eq!(wrap_prev(3, 7), 2);
    }

    #[test]
    fn single_item_stays_put() {
        assert_eq!(wrap_next(0, 1), 0);
        assert_eq!(wrap_prev(0, 1), 0);
    }

    #[test]
    fn empty_list_is_safe() {
        assert_eq!(wrap_next(5, 0), 0);
        assert_eq!(wrap_prev(5, 0), 0);
    }

    #[test]
    fn full_u8_range_does_not_overflow() {
        assert_eq!(wrap_prev(254, 255), 253);
        assert_eq!(wrap_prev(0, 255), 254);
        assert_eq!(wrap_next(254, 255), 0);
        assert_eq!(wrap_prev(200, 129), 70);
        assert_eq!(wrap_next(u8::MAX, u8::MAX), 1);
    }

    #[test]
    fn stale_index_is_reduced_first() {
        assert_eq!(wrap_next(9, 3), 1);
        assert_eq!(wrap_prev(9, 3), 2);
    }
}
