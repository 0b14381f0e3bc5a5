//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a time in seconds with millisecond precision
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.3}s")
}

/// Format a sample time against a clip length, e.g. `0.500s / 2.000s (25.0%)`
pub fn format_progress(time: f64, duration: f64) -> String {
    if duration > 0.0 {
        format!(
            "{} / {} ({:.1}%)",
            format_seconds(time),
            format_seconds(duration),
            time / duration * 100.0
        )
    } else {
        format_seconds(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
        assert_eq!(format_bytes(1048576), "1.05 MB");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(0.5, 2.0), "0.500s / 2.000s (25.0%)");
        assert_eq!(format_progress(3.0, 0.0), "3.000s");
    }
}
