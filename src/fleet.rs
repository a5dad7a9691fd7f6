//! Fleet-wide fan-out.
//!
//! Every fleet operation runs its targets on a dedicated rayon pool sized to
//! the concurrency ceiling. All targets are submitted at once; results come
//! back in input order, one per target, and a failing target never stops the
//! others.

use crate::error::{Error, Result};
use crate::release::{ReleaseOrchestrator, ReleaseReport};
use crate::repository::{ReleaseTarget, RepoRef};
use rayon::prelude::*;

/// Default number of concurrent workers: one less than the available
/// parallelism, at least one.
pub fn concurrency_ceiling() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}

/// Runs `task` for every item on a pool of `ceiling` threads.
///
/// `on_complete` is called from the worker thread as soon as an item is
/// done. The returned results are in the order of `items`.
pub fn run_bounded<T, R, F, C>(items: &[T], ceiling: usize, task: F, on_complete: C) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
    C: Fn(&T, &R) + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ceiling.max(1))
        .thread_name(|i| format!("fleet-worker-{}", i))
        .build()
        .map_err(|e| Error::Fleet {
            message: format!("cannot start worker pool: {}", e),
        })?;

    Ok(pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let result = task(item);
                on_complete(item, &result);
                result
            })
            .collect()
    }))
}

/// A target that failed during a fleet run
#[derive(Debug)]
pub struct FleetFailure {
    pub repo: RepoRef,
    pub error: Error,
}

/// Outcome of a drained fleet run
#[derive(Debug)]
pub struct FleetSummary<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<FleetFailure>,
}

impl<T> FleetSummary<T> {
    /// Pairs each target with its result; both must be in the same order.
    pub fn collect(targets: &[ReleaseTarget], results: Vec<Result<T>>) -> Self {
        let mut summary = Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
        };
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(value) => summary.succeeded.push(value),
                Err(error) => summary.failures.push(FleetFailure {
                    repo: target.repo.clone(),
                    error,
                }),
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs a fallible per-target operation across the fleet.
///
/// Each failure is logged when it happens and collected in the summary.
pub fn for_each_target<R, F, C>(
    targets: &[ReleaseTarget],
    ceiling: usize,
    task: F,
    on_complete: C,
) -> Result<FleetSummary<R>>
where
    R: Send,
    F: Fn(&ReleaseTarget) -> Result<R> + Sync,
    C: Fn(&ReleaseTarget, &Result<R>) + Sync,
{
    log::info!("running {} target(s) with {} worker(s)", targets.len(), ceiling.max(1));
    let results = run_bounded(targets, ceiling, &task, |target, result| {
        if let Err(e) = result {
            log::error!("{}: {}", target.repo, e);
        }
        on_complete(target, result);
    })?;
    let summary = FleetSummary::collect(targets, results);
    log::info!(
        "fleet run drained: {} succeeded, {} failed",
        summary.succeeded.len(),
        summary.failures.len()
    );
    Ok(summary)
}

/// Releases many repositories concurrently
pub struct FleetReleaseCoordinator<'a> {
    orchestrator: &'a ReleaseOrchestrator<'a>,
    ceiling: usize,
}

impl<'a> FleetReleaseCoordinator<'a> {
    /// `ceiling` overrides [`concurrency_ceiling`].
    pub fn new(orchestrator: &'a ReleaseOrchestrator<'a>, ceiling: Option<usize>) -> Self {
        Self {
            orchestrator,
            ceiling: ceiling.unwrap_or_else(concurrency_ceiling),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Releases every target and waits for all of them.
    pub fn release_all<C>(&self, targets: &[ReleaseTarget], on_complete: C) -> Result<FleetSummary<ReleaseReport>>
    where
        C: Fn(&ReleaseTarget, &Result<ReleaseReport>) + Sync,
    {
        for_each_target(targets, self.ceiling, |target| self.orchestrator.release(target), on_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::editors::tests::EXAMPLE_POM;
    use crate::filesystem::MemoryFS;
    use crate::release::{ReleaseChains, ReleaseParams};
    use crate::repository::mock::{MockHost, MockStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_concurrency_ceiling_is_positive() {
        assert!(concurrency_ceiling() >= 1);
    }

    #[test]
    fn test_run_bounded_keeps_input_order() {
        let items: Vec<u64> = (0..32).collect();
        let completed = AtomicUsize::new(0);
        let results = run_bounded(&items, 4, |n| n * 2, |_, _| {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(results, items.iter().map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(completed.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn test_run_bounded_respects_ceiling() {
        let items: Vec<usize> = (0..16).collect();
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run_bounded(
            &items,
            2,
            |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
            },
            |_, _| {},
        )
        .unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    fn target(name: &str) -> ReleaseTarget {
        ReleaseTarget::new(RepoRef::new("snowdrop", name, "sb-2.2.x"), None)
    }

    fn example_files() -> MemoryFS {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", EXAMPLE_POM);
        fs
    }

    #[test]
    fn test_release_all_isolates_failures() {
        let host = MockHost::new();
        let mut store = MockStore::new()
            .with_tree("snowdrop/rest-http-example", example_files())
            .with_tree("snowdrop/crud-example", example_files())
            .with_tree("snowdrop/cache-example", example_files());
        store.failing_checkouts.insert("snowdrop/crud-example".to_string());

        let config = Config::default();
        let params = ReleaseParams::new("2.2.5.RELEASE", "2.2.5.Beta1-redhat-00007").unwrap();
        let orchestrator =
            ReleaseOrchestrator::new(&host, &store, ReleaseChains::from_config(&config, &params), &config.release);
        let coordinator = FleetReleaseCoordinator::new(&orchestrator, Some(2));

        let targets = vec![
            target("rest-http-example"),
            target("crud-example"),
            target("cache-example"),
        ];
        let seen = Mutex::new(Vec::new());
        let summary = coordinator
            .release_all(&targets, |target, result| {
                seen.lock().unwrap().push((target.repo.name.clone(), result.is_ok()));
            })
            .unwrap();

        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].repo.name, "crud-example");
        let released: Vec<&str> = summary.succeeded.iter().map(|r| r.repo.name.as_str()).collect();
        assert_eq!(released, vec!["rest-http-example", "cache-example"]);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }
}
