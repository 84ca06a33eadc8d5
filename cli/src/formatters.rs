//! Output formatting utilities

use colored::*;

/// Format a lifecycle state with appropriate color
pub fn format_state(state: &str) -> ColoredString {
    match state {
        "running" => state.green(),
        "stopped" => state.red(),
        "starting" | "stopping" => state.yellow(),
        _ => state.normal(),
    }
}

/// Format a liveness verdict with appropriate color
pub fn format_liveness(liveness: &str) -> ColoredString {
    match liveness {
        "healthy" => liveness.green(),
        "unhealthy" => liveness.red(),
        "not_checkable" => "not checkable".cyan(),
        _ => liveness.normal(),
    }
}

pub fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Truncate to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("redis", 10), "redis");
        assert_eq!(truncate("a long description", 10), "a long ...");
        assert_eq!(truncate("héhéhéhé", 5), "hé...");
    }

    #[test]
    fn test_format_opt() {
        assert_eq!(format_opt(Some(6379)), "6379");
        assert_eq!(format_opt::<u16>(None), "-");
    }
}
