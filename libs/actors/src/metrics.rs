//! Cell Metrics
//!
//! Relaxed atomic counters updated by senders and by the processing task.
//! Counters are monotonic; read them through [`CellMetrics::snapshot`].

use crate::mailbox::Lane;
use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-actor counters
#[derive(Debug, Default)]
pub struct CellMetrics {
    pub system_enqueued: AtomicU64,
    pub user_enqueued: AtomicU64,
    pub mailbox_full_rejections: AtomicU64,

    pub system_delivered: AtomicU64,
    pub user_delivered: AtomicU64,
    pub total_processing_time_ns: AtomicU64,

    // Handler outcomes
    pub unrecognized_messages: AtomicU64,
    pub handler_failures: AtomicU64,
    pub handler_panics: AtomicU64,

    // Scheduling
    pub drain_passes: AtomicU64,
    pub rearms: AtomicU64,
    /// Passes that never ran, whether refused or dropped by the dispatcher
    pub dispatch_failures: AtomicU64,
    /// Of those, the ones from a re-arm, where no sender saw the error
    pub rearm_failures: AtomicU64,
    pub largest_pass: AtomicU64,
}

impl CellMetrics {
    pub fn record_enqueued(&self, lane: Lane) {
        match lane {
            Lane::System => self.system_enqueued.fetch_add(1, Ordering::Relaxed),
            Lane::User => self.user_enqueued.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_mailbox_full(&self) {
        self.mailbox_full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, lane: Lane, duration: Duration) {
        match lane {
            Lane::System => self.system_delivered.fetch_add(1, Ordering::Relaxed),
            Lane::User => self.user_delivered.fetch_add(1, Ordering::Relaxed),
        };
        self.total_processing_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_unrecognized(&self) {
        self.unrecognized_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished drain pass and how many messages it handled
    pub fn record_pass(&self, processed: usize) {
        self.drain_passes.fetch_add(1, Ordering::Relaxed);
        self.largest_pass
            .fetch_max(processed as u64, Ordering::Relaxed);
    }

    pub fn record_rearm(&self) {
        self.rearms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rearm_failure(&self) {
        self.rearm_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.system_delivered.load(Ordering::Relaxed)
            + self.user_delivered.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_processing_time_ns.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    pub fn snapshot(&self) -> CellStats {
        CellStats {
            system_enqueued: self.system_enqueued.load(Ordering::Relaxed),
            user_enqueued: self.user_enqueued.load(Ordering::Relaxed),
            mailbox_full_rejections: self.mailbox_full_rejections.load(Ordering::Relaxed),
            system_delivered: self.system_delivered.load(Ordering::Relaxed),
            user_delivered: self.user_delivered.load(Ordering::Relaxed),
            unrecognized_messages: self.unrecognized_messages.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            drain_passes: self.drain_passes.load(Ordering::Relaxed),
            rearms: self.rearms.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            rearm_failures: self.rearm_failures.load(Ordering::Relaxed),
            largest_pass: self.largest_pass.load(Ordering::Relaxed),
            avg_processing_time_ns: self.avg_processing_time_ns(),
        }
    }
}

/// Point-in-time copy of [`CellMetrics`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStats {
    pub system_enqueued: u64,
    pub user_enqueued: u64,
    pub mailbox_full_rejections: u64,
    pub system_delivered: u64,
    pub user_delivered: u64,
    pub unrecognized_messages: u64,
    pub handler_failures: u64,
    pub handler_panics: u64,
    pub drain_passes: u64,
    pub rearms: u64,
    pub dispatch_failures: u64,
    pub rearm_failures: u64,
    pub largest_pass: u64,
    pub avg_processing_time_ns: f64,
}

impl CellStats {
    /// Messages handed to the handler across both lanes
    pub fn delivered(&self) -> u64 {
        self.system_delivered + self.user_delivered
    }

    /// Messages accepted into the mailbox across both lanes
    pub fn enqueued(&self) -> u64 {
        self.system_enqueued + self.user_enqueued
    }
}

/// Aggregation across actors. `largest_pass` keeps the maximum and the
/// average is weighted by delivered messages.
impl AddAssign<&CellStats> for CellStats {
    fn add_assign(&mut self, other: &CellStats) {
        let delivered = self.delivered();
        let other_delivered = other.delivered();
        let total = delivered + other_delivered;
        self.avg_processing_time_ns = if total == 0 {
            0.0
        } else {
            (self.avg_processing_time_ns * delivered as f64
                + other.avg_processing_time_ns * other_delivered as f64)
                / total as f64
        };

        self.system_enqueued += other.system_enqueued;
        self.user_enqueued += other.user_enqueued;
        self.mailbox_full_rejections += other.mailbox_full_rejections;
        self.system_delivered += other.system_delivered;
        self.user_delivered += other.user_delivered;
        self.unrecognized_messages += other.unrecognized_messages;
        self.handler_failures += other.handler_failures;
        self.handler_panics += other.handler_panics;
        self.drain_passes += other.drain_passes;
        self.rearms += other.rearms;
        self.dispatch_failures += other.dispatch_failures;
        self.rearm_failures += other.rearm_failures;
        self.largest_pass = self.largest_pass.max(other.largest_pass);
    }
}
