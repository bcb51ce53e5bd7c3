/// Remaining-time text for a running countdown, e.g. "1h 2m 3s left".
pub fn format_remaining(remaining_secs: u32, paused: bool) -> String {
    let mut text = if remaining_secs >= 3600 {
        format!(
            "{}h {}m {}s left",
            remaining_secs / 3600,
            (remaining_secs % 3600) / 60,
            remaining_secs % 60
        )
    } else if remaining_secs >= 60 {
        format!("{}m {}s left", remaining_secs / 60, remaining_secs % 60)
    } else {
        format!("{}s left", remaining_secs)
    };
    if paused {
        text.push_str(" (Paused)");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0, false), "0s left");
        assert_eq!(format_remaining(59, false), "59s left");
        assert_eq!(format_remaining(60, false), "1m 0s left");
        assert_eq!(format_remaining(61, false), "1m 1s left");
        assert_eq!(format_remaining(3599, false), "59m 59s left");
        assert_eq!(format_remaining(3600, false), "1h 0m 0s left");
        assert_eq!(format_remaining(3661, false), "1h 1m 1s left");
    }

    #[test]
    fn test_format_remaining_paused_suffix() {
        assert_eq!(format_remaining(90, true), "1m 30s left (Paused)");
        assert_eq!(format_remaining(5, true), "5s left (Paused)");
    }
}
