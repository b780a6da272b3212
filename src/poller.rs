//! The polling loop: fetch the public IP, compare it with the last one that
//! was published, publish on change, sleep, repeat.
//!
//! The last-known IP only ever advances after a successful publish. Any
//! failure leaves it alone, so the next cycle retries the same address.

use std::io;
use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::ip::{FetchError, IpSource};
use crate::persistence::LastIpStore;
use crate::pipeline::{Pipeline, PublishError};
use crate::services::TxtPublisher;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("unable to fetch the public IP: {0}")]
    FetchFailed(FetchError),

    #[error("unable to read the last IP: {0}")]
    ReadLastIp(io::Error),

    #[error(transparent)]
    Publish(PublishError),

    #[error("TXT record updated, but the last IP could not be saved: {0}")]
    Persist(io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Unchanged(Box<str>),

    Published { previous: String, current: Box<str> },

    /// The publisher only pretended to update the record, so the last IP
    /// was not saved.
    Simulated(Box<str>),
}

pub struct Poller<S, P> {
    source: S,
    store: LastIpStore,
    pipeline: Pipeline<P>,
    interval: Option<NonZeroU32>,
}

impl<S: IpSource, P: TxtPublisher> Poller<S, P> {
    /// With no `interval`, [`Poller::run`] performs a single cycle.
    pub fn new(
        source: S,
        store: LastIpStore,
        pipeline: Pipeline<P>,
        interval: Option<NonZeroU32>,
    ) -> Self {
        Self {
            source,
            store,
            pipeline,
            interval,
        }
    }

    pub fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let current = self.source.fetch().map_err(CycleError::FetchFailed)?;

        let previous = self.store.read().map_err(CycleError::ReadLastIp)?;
        if *current == *previous {
            return Ok(CycleOutcome::Unchanged(current));
        }

        info!(
            "IP changed: {} -> {}",
            if previous.is_empty() { "<none>" } else { previous.as_str() },
            current
        );

        self.pipeline.publish(&current).map_err(CycleError::Publish)?;

        if !self.pipeline.publisher().commits() {
            return Ok(CycleOutcome::Simulated(current));
        }

        self.store.write(&current).map_err(CycleError::Persist)?;

        Ok(CycleOutcome::Published { previous, current })
    }

    /// Runs cycles until the process is terminated, or once if no interval
    /// was configured. A failed cycle is logged and waits for the next tick
    /// like any other.
    pub fn run(&mut self) {
        loop {
            match self.run_cycle() {
                Ok(CycleOutcome::Unchanged(ip)) => info!("IP unchanged: {}", ip),
                Ok(CycleOutcome::Published { .. }) => info!("Updated TXT and saved last IP."),
                Ok(CycleOutcome::Simulated(ip)) => info!("Dry run: {} not saved as the last IP", ip),
                Err(e @ CycleError::Persist(_)) => warn!("{}; it will be published again", e),
                Err(e) => error!("{}", e),
            }

            if let Some(sleep_for) = &self.interval {
                std::thread::sleep(Duration::from_secs(sleep_for.get() as u64));
            } else {
                break; // 0 interval makes this a fire-once program.
            }
        }
    }
}
