//! The ambient scheduler.
//!
//! Once the audio backend is ready, every community is scanned for an
//! eligible room; each hit gets a session playing a random ambient clip.
//! The next scan is scheduled a random 30..60 minutes after the start of the
//! current one, so processing time does not drift the cadence.

use crate::backend::SessionBinding;
use crate::config::SchedulerConfig;
use crate::eligibility::select_room;
use crate::lifecycle::ContentSource;
use crate::orchestrator::Orchestrator;
use rand::Rng;
use sobasa_types::{ChannelId, CommunityId};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Draws the delay until the next scan, uniformly from
/// `[min_delay_ms, max_delay_ms)`.
pub fn sample_delay<R: Rng + ?Sized>(config: &SchedulerConfig, rng: &mut R) -> Duration {
    let min = config.min_delay_ms;
    let max = config.max_delay_ms.max(min + 1);
    Duration::from_millis(rng.gen_range(min..max))
}

impl Orchestrator {
    /// Starts the ambient scheduler task. Only the first call has an
    /// effect; returns whether this call started it.
    pub fn start_scheduler(self: &Arc<Self>) -> bool {
        if !self.config.scheduler.enabled {
            tracing::info!("ambient scheduler disabled by configuration");
            return false;
        }
        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            return false;
        }

        tracing::info!(
            min_delay_ms = self.config.scheduler.min_delay_ms,
            max_delay_ms = self.config.scheduler.max_delay_ms,
            "starting ambient scheduler"
        );
        tokio::spawn(run_ambient_scheduler(Arc::clone(self)));
        true
    }

    /// Runs one scan. Each eligible community gets its own task opening a
    /// session; failures are logged there and never stop the scan.
    ///
    /// Returns the rooms a join was started for.
    pub fn ambient_tick(self: &Arc<Self>) -> Vec<(CommunityId, ChannelId)> {
        let Some(bot) = self.directory.current_user() else {
            tracing::warn!("skipping ambient scan: bot identity not known yet");
            return Vec::new();
        };

        let picks: Vec<(CommunityId, ChannelId)> = {
            let mut rng = rand::thread_rng();
            self.directory
                .communities()
                .into_iter()
                .filter_map(|community| self.directory.snapshot(community))
                .filter_map(|snapshot| {
                    select_room(&snapshot, &self.suppression, &mut rng)
                        .map(|room| (snapshot.id, room))
                })
                .collect()
        };

        for &(community, room) in &picks {
            let orchestrator = Arc::clone(self);
            let requester = bot.clone();
            tokio::spawn(async move {
                let binding = SessionBinding {
                    community,
                    voice_room: room,
                    text_channel: room,
                };
                if let Err(e) = orchestrator
                    .open_session(binding, ContentSource::Ambient, &requester)
                    .await
                {
                    tracing::error!(%community, %room, error = %e, "ambient join failed");
                }
            });
        }

        tracing::debug!(joins = picks.len(), "ambient scan finished");
        picks
    }
}

/// Scans forever, rescheduling after a fresh random delay on every tick.
pub async fn run_ambient_scheduler(orchestrator: Arc<Orchestrator>) {
    loop {
        let started = Instant::now();
        orchestrator.ambient_tick();

        let delay = sample_delay(&orchestrator.config.scheduler, &mut rand::thread_rng());
        tracing::debug!(delay_ms = delay.as_millis() as u64, "next ambient scan scheduled");
        sleep_until(started + delay).await;
    }
}
