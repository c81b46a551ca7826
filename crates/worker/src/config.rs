//! # Worker Configuration
//!
//! Settings for the background side of the shop: the calendar used to decide
//! "today", job overlap leases, the sweep cadence and the broadcast buffer.
//!
//! ## Environment Variables
//!
//! - `SHOP_TIMEZONE`: IANA zone that defines the shop's calendar day (default: "UTC")
//! - `JOB_LOCK_SECONDS`: Lifetime of a job overlap lease (default: 180)
//! - `SWEEP_INTERVAL_SECONDS`: Period of the in-process sweep loop (default: 86400)
//! - `BROADCAST_CAPACITY`: Buffer size of the change-event channel (default: 256)

use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};

pub const DEFAULT_JOB_LOCK_SECONDS: u64 = 180;
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 86_400;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Zone whose calendar day counts as "today" for schedules and the sweep
    pub timezone: Tz,

    /// How long an overlap lease is held before it expires on its own
    pub job_lock: Duration,

    /// How often the server's sweep loop fires
    pub sweep_interval: Duration,

    /// Events buffered per subscriber before slow readers start skipping
    pub broadcast_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            job_lock: Duration::from_secs(DEFAULT_JOB_LOCK_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Loads the worker settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the worker settings through `lookup`, which returns the raw value
    /// of an environment variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timezone = match lookup("SHOP_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid SHOP_TIMEZONE value '{name}': {e}"))?,
            None => Tz::UTC,
        };

        let job_lock_seconds: u64 = lookup("JOB_LOCK_SECONDS")
            .unwrap_or_else(|| DEFAULT_JOB_LOCK_SECONDS.to_string())
            .parse()
            .wrap_err("Invalid JOB_LOCK_SECONDS value")?;

        let sweep_interval_seconds: u64 = lookup("SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|| DEFAULT_SWEEP_INTERVAL_SECONDS.to_string())
            .parse()
            .wrap_err("Invalid SWEEP_INTERVAL_SECONDS value")?;
        if sweep_interval_seconds == 0 {
            return Err(eyre!("SWEEP_INTERVAL_SECONDS must be greater than zero"));
        }

        let broadcast_capacity: usize = lookup("BROADCAST_CAPACITY")
            .unwrap_or_else(|| DEFAULT_BROADCAST_CAPACITY.to_string())
            .parse()
            .wrap_err("Invalid BROADCAST_CAPACITY value")?;
        if broadcast_capacity == 0 {
            return Err(eyre!("BROADCAST_CAPACITY must be greater than zero"));
        }

        Ok(Self {
            timezone,
            job_lock: Duration::from_secs(job_lock_seconds),
            sweep_interval: Duration::from_secs(sweep_interval_seconds),
            broadcast_capacity,
        })
    }

    /// The lease lifetime as a calendar duration, for comparing against a [`Clock`](repairdesk_core::clock::Clock).
    pub fn job_lock_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.job_lock)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_JOB_LOCK_SECONDS as i64))
    }
}
