//! Glyphs used across the chat widgets.

/// Typing indicator frames.
pub const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Marks the message feedback would target.
pub const SELECTED: &str = "▸ ";

/// Prefixed to crisis replies.
pub const CRISIS: &str = "⚠ ";

/// Cursor block in the input bar.
pub const CURSOR: &str = "█";

/// Spinner frame for an elapsed time, cycling once per `period_ms`.
pub fn spinner_frame(elapsed_ms: u128, period_ms: u64) -> &'static str {
    let step = (u128::from(period_ms.max(1)) / SPINNER.len() as u128).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let index = ((elapsed_ms / step) % SPINNER.len() as u128) as usize;
    SPINNER[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_cycles_over_period() {
        assert_eq!(spinner_frame(0, 1000), SPINNER[0]);
        assert_eq!(spinner_frame(250, 1000), SPINNER[1]);
        assert_eq!(spinner_frame(999, 1000), SPINNER[3]);
        assert_eq!(spinner_frame(1000, 1000), SPINNER[0]);
    }

    #[test]
    fn test_spinner_tolerates_zero_period() {
        assert_eq!(spinner_frame(5, 0), SPINNER[1]);
    }
}
