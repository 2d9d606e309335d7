/// Decide whether the display should be powered, given how long the keypad
/// has been idle.
pub fn display_should_be_on(auto_off_enabled: bool, idle_ms: u64, auto_off_timeout_ms: u64) -> bool {
    !(auto_off_enabled && idle_ms >= auto_off_timeout_ms)
}

/// Decide whether a periodic data fetch is due.
///
/// Never fetches without a link. The first fetch after connecting is due
/// immediately when no fetch has happened yet.
pub fn fetch_due(connected: bool, last_fetch_ms: Option<u64>, now_ms: u64, interval_ms: u64) -> bool {
    if !connected {
        return false;
    }

    match last_fetch_ms {
        Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_stays_on_before_timeout() {
        assert!(display_should_be_on(true, 119_999, 120_000));
    }

    #[test]
    fn display_turns_off_at_timeout() {
        assert!(!display_should_be_on(true, 120_000, 120_000));
    }

    #[test]
    fn disabled_auto_off_keeps_display_on() {
        assert!(display_should_be_on(false, u64::MAX, 120_000));
    }

    #[test]
    fn no_fetch_without_link() {
        assert!(!fetch_due(false, None, 1_000_000, 60_000));
    }

    #[test]
    fn first_fetch_is_immediate() {
        assert!(fetch_due(true, None, 0, 60_000));
    }

    #[test]
    fn fetch_waits_for_interval() {
        assert!(!fetch_due(true, Some(10_000), 69_999, 60_000));
        assert!(fetch_due(true, Some(10_000), 70_000, 60_000));
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        assert!(!fetch_due(true, Some(10_000), 5_000, 60_000));
    }
}
