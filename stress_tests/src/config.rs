// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Scale presets for stress tests.

use std::env;

/// Scale level for stress tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleLevel {
    /// 10K focus words, ~1 min
    Quick,
    /// 100K focus words, ~5 min
    Full,
    /// Time-bound accumulation (1 hour)
    Endurance,
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub scale: ScaleLevel,
    /// Distinct focus words receiving vectors.
    pub item_count: usize,
    /// Distinct context words, and so roughly the basis size.
    pub feature_count: usize,
    pub thread_count: usize,
    pub documents: usize,
    pub document_length: usize,
    pub duration_secs: u64,
}

impl StressConfig {
    /// Get thread count, respecting `STRESS_THREADS` env var override.
    #[must_use]
    pub fn effective_thread_count(&self) -> usize {
        env_override("STRESS_THREADS").unwrap_or(self.thread_count)
    }

    /// Get item count, respecting `STRESS_ITEMS` env var override.
    #[must_use]
    pub fn effective_item_count(&self) -> usize {
        env_override("STRESS_ITEMS").unwrap_or(self.item_count)
    }

    /// Get duration in seconds, respecting `STRESS_DURATION` env var override.
    #[must_use]
    pub fn effective_duration_secs(&self) -> u64 {
        env_override("STRESS_DURATION").unwrap_or(self.duration_secs)
    }
}

impl ScaleLevel {
    /// Scale named by `STRESS_SCALE` (`quick`, `full`, `endurance`), quick otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        env::var("STRESS_SCALE")
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or(Self::Quick)
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "quick" => Some(Self::Quick),
            "full" => Some(Self::Full),
            "endurance" => Some(Self::Endurance),
            _ => None,
        }
    }

    #[must_use]
    pub const fn config(self) -> StressConfig {
        match self {
            Self::Quick => quick_config(),
            Self::Full => full_config(),
            Self::Endurance => endurance_config(),
        }
    }
}

/// Preset for the scale selected by `STRESS_SCALE`.
#[must_use]
pub fn scale_config() -> StressConfig {
    ScaleLevel::from_env().config()
}

fn env_override<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Quick stress config: 10K focus words, 8 threads.
#[must_use]
pub const fn quick_config() -> StressConfig {
    StressConfig {
        scale: ScaleLevel::Quick,
        item_count: 10_000,
        feature_count: 2_000,
        thread_count: 8,
        documents: 5_000,
        document_length: 40,
        duration_secs: 60,
    }
}

/// Full stress config: 100K focus words, 16 threads.
#[must_use]
pub const fn full_config() -> StressConfig {
    StressConfig {
        scale: ScaleLevel::Full,
        item_count: 100_000,
        feature_count: 20_000,
        thread_count: 16,
        documents: 50_000,
        document_length: 60,
        duration_secs: 300,
    }
}

/// Endurance stress config: 50K focus words, 8 threads, 1 hour.
#[must_use]
pub const fn endurance_config() -> StressConfig {
    StressConfig {
        scale: ScaleLevel::Endurance,
        item_count: 50_000,
        feature_count: 10_000,
        thread_count: 8,
        documents: 20_000,
        document_length: 40,
        duration_secs: 3600,
    }
}
