// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Stress test utilities for semantic spaces.
//!
//! Provides corpus and dependency-path generators, latency histograms and
//! scale presets for exercising basis allocation and accumulation under
//! heavy thread contention.

pub mod config;
pub mod generators;
pub mod metrics;

pub use config::{
    endurance_config, full_config, quick_config, scale_config, ScaleLevel, StressConfig,
};
pub use generators::{
    generate_dependency_batch, generate_documents, generate_feature_keys, vocabulary,
};
pub use metrics::{LatencyHistogram, LatencySnapshot, ThroughputCounter};

/// Format duration as human-readable string.
#[must_use]
pub fn format_duration(secs: f64) -> String {
    if secs >= 3600.0 {
        let hours = secs / 3600.0;
        format!("{hours:.1}h")
    } else if secs >= 60.0 {
        let mins = secs / 60.0;
        format!("{mins:.1}m")
    } else if secs >= 1.0 {
        format!("{secs:.2}s")
    } else {
        format!("{:.2}ms", secs * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500.00ms");
        assert_eq!(format_duration(2.0), "2.00s");
        assert_eq!(format_duration(90.0), "1.5m");
        assert_eq!(format_duration(7200.0), "2.0h");
    }
}
