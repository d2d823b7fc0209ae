//! Options accepted by `Fetcher::go_to` (§4.10 step 6).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GoToOptions {
    /// Wait for the network-idle lifecycle event before considering the
    /// navigation complete.
    pub wait_until_network_idle: bool,
    pub timeout: Duration,
}

impl Default for GoToOptions {
    fn default() -> Self {
        Self { wait_until_network_idle: true, timeout: Duration::from_secs(30) }
    }
}
