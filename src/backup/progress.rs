//! One-way progress signals emitted while a backup job runs.

use derive_more::Display;

static SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Progress {
    #[display("determining files to backup...")]
    DeterminingFiles,
    #[display("archiving {count} files...")]
    Archiving { count: usize },
    #[display("copying archive (size: {size}) to {store_type}-destination")]
    Copying { size: String, store_type: String },
}

pub trait ProgressObserver {
    fn notify(&self, progress: &Progress);
}

/// Sends every notification to the `tracing` subscriber at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn notify(&self, progress: &Progress) {
        tracing::info!("{progress}");
    }
}

/// Formats a byte count with 1024 based units and at most two decimals.
pub fn human_readable_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", SIZE_UNITS[0]);
    }

    // Step up on the rounded value so 1023.999 KB prints as 1 MB.
    let mut unit = 0;
    let mut value = bytes as f64;
    while round_to_cents(value) >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{rounded} {}", SIZE_UNITS[unit])
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(0), "0 B");
        assert_eq!(human_readable_size(1), "1 B");
        assert_eq!(human_readable_size(1023), "1023 B");
        assert_eq!(human_readable_size(1024), "1 KB");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(1_048_576), "1 MB");
        assert_eq!(human_readable_size(5 * 1024 * 1024 * 1024 + 1024 * 1024 * 1024 / 4), "5.25 GB");
    }

    #[test]
    fn test_human_readable_size_rounds_up_to_next_unit() {
        assert_eq!(human_readable_size(1_048_575), "1 MB");
        assert_eq!(human_readable_size(1024 * 1024 - 6), "1023.99 KB");
        assert_eq!(human_readable_size(1024u64.pow(3) - 1), "1 GB");
    }

    #[test]
    fn test_human_readable_size_caps_at_largest_unit() {
        let five_pb = 5 * 1024u64.pow(5);
        assert_eq!(human_readable_size(five_pb), "5120 TB");
    }

    #[test]
    fn test_progress_display() {
        assert_eq!(
            Progress::Archiving { count: 3 }.to_string(),
            "archiving 3 files..."
        );
        assert_eq!(
            Progress::Copying {
                size: "1.5 KB".into(),
                store_type: "local".into()
            }
            .to_string(),
            "copying archive (size: 1.5 KB) to local-destination"
        );
    }
}
