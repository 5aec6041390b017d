//! Vulkan validation layer support
//!
//! Compiled only with the `vulkan-validation` feature: debug messenger
//! callback routed through the helios logging sink, plus per-severity
//! counters readable after a run.

#![cfg(feature = "vulkan-validation")]

use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};

use ash::vk;
use helios_render::{render_debug, render_error, render_info, render_warn};

/// Per-severity counts of validation messages
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct StatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

static STATS: StatsTracker = StatsTracker {
    errors: AtomicU32::new(0),
    warnings: AtomicU32::new(0),
    info: AtomicU32::new(0),
    verbose: AtomicU32::new(0),
};

/// Validation message counts since the last reset
pub fn validation_stats() -> ValidationStats {
    ValidationStats {
        errors: STATS.errors.load(Ordering::Relaxed),
        warnings: STATS.warnings.load(Ordering::Relaxed),
        info: STATS.info.load(Ordering::Relaxed),
        verbose: STATS.verbose.load(Ordering::Relaxed),
    }
}

/// Reset the counters, called when a backend initializes
pub fn reset_validation_stats() {
    STATS.errors.store(0, Ordering::Relaxed);
    STATS.warnings.store(0, Ordering::Relaxed);
    STATS.info.store(0, Ordering::Relaxed);
    STATS.verbose.store(0, Ordering::Relaxed);
}

/// Debug messenger callback
///
/// # Safety
///
/// Invoked by the Vulkan loader with valid callback data pointers.
pub unsafe extern "system" fn vulkan_debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() {
        return vk::FALSE;
    }
    let data = &*callback_data;
    let message = if data.p_message.is_null() {
        String::new()
    } else {
        CStr::from_ptr(data.p_message).to_string_lossy().into_owned()
    };

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            STATS.errors.fetch_add(1, Ordering::Relaxed);
            render_error!("helios::vulkan", "[{:?}] {}", message_type, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            STATS.warnings.fetch_add(1, Ordering::Relaxed);
            render_warn!("helios::vulkan", "[{:?}] {}", message_type, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            STATS.info.fetch_add(1, Ordering::Relaxed);
            render_info!("helios::vulkan", "[{:?}] {}", message_type, message);
        }
        _ => {
            STATS.verbose.fetch_add(1, Ordering::Relaxed);
            render_debug!("helios::vulkan", "[{:?}] {}", message_type, message);
        }
    }

    vk::FALSE
}
