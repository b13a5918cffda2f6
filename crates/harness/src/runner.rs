//! Concurrent run driver.
//!
//! One tokio task per virtual user. Each task starts its session, then picks
//! and runs weighted actions with a pause between them until the run ends.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{info, warn};

use crate::pool::PoolSizes;
use crate::stats::Report;
use crate::workload::{ActionTally, Profile, RunContext, VirtualUser};

/// Run parameters.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of concurrent virtual users.
    pub users: usize,
    /// Wall-clock length of the run.
    pub duration: Duration,
    /// Spread user start times evenly over this period.
    pub ramp_up: Duration,
    /// Base seed; user `n` draws from `seed + n`.
    pub seed: u64,
}

/// Results of a finished run.
#[derive(Debug)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub report: Report,
    /// Outcome counts per action name.
    pub actions: HashMap<&'static str, ActionTally>,
    pub pool: PoolSizes,
    /// Users whose task ended abnormally.
    pub aborted_users: usize,
}

/// Start delay for user `index` of `users` within `ramp_up`.
pub fn start_delay(index: usize, users: usize, ramp_up: Duration) -> Duration {
    if users == 0 || ramp_up.is_zero() {
        return Duration::ZERO;
    }
    ramp_up.mul_f64(index as f64 / users as f64)
}

/// Drive `options.users` virtual users of `profile` for `options.duration`.
pub async fn run(ctx: Arc<RunContext>, profile: Arc<Profile>, options: RunOptions) -> RunSummary {
    let start_time = Instant::now();
    let deadline = start_time + options.duration;

    info!(
        profile = %profile.kind,
        users = options.users,
        duration_secs = options.duration.as_secs_f64(),
        "starting load run"
    );

    let mut handles = Vec::with_capacity(options.users);
    for user_id in 0..options.users {
        let ctx = Arc::clone(&ctx);
        let profile = Arc::clone(&profile);
        let delay = start_delay(user_id, options.users, options.ramp_up);
        let seed = options.seed.wrapping_add(user_id as u64);

        handles.push(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if Instant::now() >= deadline {
                return HashMap::new();
            }
            let mut user = VirtualUser::new(user_id, ctx, profile, seed);
            user.start().await;
            user.run_until(deadline).await
        }));
    }

    let mut actions: HashMap<&'static str, ActionTally> = HashMap::new();
    let mut aborted_users = 0;
    for result in join_all(handles).await {
        match result {
            Ok(tallies) => {
                for (name, tally) in tallies {
                    actions.entry(name).or_default().merge(tally);
                }
            }
            Err(e) => {
                aborted_users += 1;
                warn!(error = %e, "virtual user task failed");
            }
        }
    }

    let elapsed = start_time.elapsed();
    let pool = ctx.pool.sizes();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        requests = ctx.stats.total_requests(),
        hot = pool.hot,
        discovered = pool.all,
        "load run finished"
    );

    RunSummary {
        elapsed,
        report: ctx.stats.report(elapsed),
        actions,
        pool,
        aborted_users,
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn start_delays_spread_over_ramp_up() {
        let ramp = Duration::from_secs(10);
        assert_eq!(start_delay(0, 4, ramp), Duration::ZERO);
        assert_eq!(start_delay(2, 4, ramp), Duration::from_secs(5));
        assert!(start_delay(3, 4, ramp) < ramp);
        assert_eq!(start_delay(3, 4, Duration::ZERO), Duration::ZERO);
    }
}
