use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use crossbeam::channel::bounded;
use crossbeam::thread::scope;
use tracing::debug;

/// Run `work` over `units` on at most `threads` scoped threads.
///
/// The input channel is bounded by the thread count, so handing out a new
/// unit blocks until a worker is free. Results come back in unit order.
/// Once any unit fails no further unit is started, and the error of the
/// earliest failed unit is returned.
pub fn run_bounded<T, R, F>(units: Vec<T>, threads: usize, work: F) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(usize, T) -> Result<R> + Sync,
{
    let total = units.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let threads = threads.clamp(1, total);
    let failed = AtomicBool::new(false);

    let outcome = scope(|scope| -> Result<Vec<R>> {
        let (in_sender, in_receiver) = bounded::<(usize, T)>(threads);
        let (out_sender, out_receiver) = bounded::<(usize, Result<R>)>(total);
        let work = &work;
        let failed = &failed;

        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let in_receiver = in_receiver.clone();
                let out_sender = out_sender.clone();
                scope.spawn(move |_| {
                    for (index, unit) in in_receiver {
                        if failed.load(Ordering::Acquire) {
                            continue;
                        }
                        let result = work(index, unit);
                        if result.is_err() {
                            failed.store(true, Ordering::Release);
                        }
                        if out_sender.send((index, result)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        // workers hold the only remaining ends
        drop(in_receiver);
        drop(out_sender);

        let mut dispatched = 0usize;
        for (index, unit) in units.into_iter().enumerate() {
            if failed.load(Ordering::Acquire) || in_sender.send((index, unit)).is_err() {
                break;
            }
            dispatched += 1;
        }
        drop(in_sender);

        let mut results = BTreeMap::new();
        let mut first_error: Option<(usize, anyhow::Error)> = None;
        for (index, result) in out_receiver {
            match result {
                Ok(value) => {
                    results.insert(index, value);
                }
                Err(err) => {
                    if first_error.as_ref().map_or(true, |(first, _)| index < *first) {
                        first_error = Some((index, err));
                    }
                }
            }
        }

        for worker in workers {
            worker
                .join()
                .map_err(|_| anyhow!("worker thread panicked"))?;
        }
        debug!(total, dispatched, threads, "worker pool finished");

        if let Some((index, err)) = first_error {
            return Err(err.context(format!("work unit {} failed", index)));
        }
        Ok(results.into_values().collect())
    });

    outcome.map_err(|_| anyhow!("worker pool panicked"))?
}
