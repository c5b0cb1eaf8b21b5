//! Bounded worker pool for CPU-bound recognition
//!
//! Fans independent recognition work out over a fixed number of scoped
//! threads. Workers never touch the capture/input device; screenshots
//! are taken serially by the caller and only the pixel crunching runs
//! here.

use crossbeam_channel::unbounded;

/// Run `f` over every item on up to `workers` threads, returning results
/// in input order.
pub fn map<T, R, F>(items: Vec<T>, workers: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workers = workers.max(1).min(items.len());

    let (task_tx, task_rx) = unbounded::<(usize, T)>();
    let (result_tx, result_rx) = unbounded::<(usize, R)>();

    let count = items.len();
    for pair in items.into_iter().enumerate() {
        task_tx.send(pair).ok();
    }
    drop(task_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let f = &f;
            scope.spawn(move || {
                while let Ok((idx, item)) = task_rx.recv() {
                    result_tx.send((idx, f(item))).ok();
                }
            });
        }
        drop(result_tx);

        let mut results: Vec<Option<R>> = (0..count).map(|_| None).collect();
        while let Ok((idx, r)) = result_rx.recv() {
            results[idx] = Some(r);
        }
        results.into_iter().flatten().collect()
    })
}
