//! Tunable constants driving the scheduler (§6).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_depth: u32,
    pub concurrent_workers: usize,
    pub job_queue_size: usize,
    pub goto_timeout: Duration,
    /// Rate-limit requeue threshold T (§4.10 step 4): a reservation delayed
    /// longer than this is cancelled and the job requeued instead of making
    /// the worker sleep it out.
    pub requeue_threshold: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    pub same_origin_only: bool,
    pub agent_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            concurrent_workers: 5,
            job_queue_size: 1000,
            goto_timeout: Duration::from_millis(30_000),
            requeue_threshold: Duration::from_secs(3),
            jitter_min: Duration::from_millis(0),
            jitter_max: Duration::from_millis(250),
            same_origin_only: false,
            agent_name: "crawler".to_string(),
        }
    }
}
