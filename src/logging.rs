// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Process-wide verbosity switch
//!
//! Diagnostics are emitted through `tracing`, but only while the flag is set.
//! The flag is read on every call, so toggling it takes effect immediately.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable diagnostic logging.
pub fn set_verbosity(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Current state of the diagnostic logging flag (off by default).
pub fn verbosity() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `tracing::info!` gated on [`verbosity`].
#[macro_export]
macro_rules! verbose_info {
    ($($arg:tt)*) => {
        if $crate::logging::verbosity() {
            ::tracing::info!($($arg)*);
        }
    };
}

/// `tracing::debug!` gated on [`verbosity`].
#[macro_export]
macro_rules! verbose_debug {
    ($($arg:tt)*) => {
        if $crate::logging::verbosity() {
            ::tracing::debug!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let before = verbosity();
        set_verbosity(true);
        assert!(verbosity());
        verbose_info!(value = 1, "logging while enabled");
        set_verbosity(false);
        assert!(!verbosity());
        verbose_debug!("suppressed");
        set_verbosity(before);
    }
}
