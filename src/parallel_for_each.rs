use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

#[derive(Copy, Clone, Debug)]
pub enum WorkerCount {
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Manual(n) => n.get(),
        }
    }
}

/// Maps `f` over `0..count` on a pool of worker threads and gathers the
/// results in index order.
///
/// Work items are claimed dynamically through a shared atomic counter, so
/// uneven items (screen rows of very different scene complexity, octants of
/// very different triangle counts) balance themselves. Workers are pinned
/// to cores when core IDs are available.
pub fn parallel_map<T, F>(count: usize, worker_count: WorkerCount, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let workers = worker_count.resolve().min(count).max(1);
    let cores = core_affinity::get_core_ids().unwrap_or_default();

    let next_index = AtomicUsize::new(0);
    let results = Mutex::new((0..count).map(|_| None).collect::<Vec<Option<T>>>());

    thread::scope(|scope| {
        for worker_id in 0..workers {
            let core = cores.get(worker_id % cores.len().max(1)).copied();
            let next_index = &next_index;
            let results = &results;
            let f = &f;

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn_scoped(scope, move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    loop {
                        let index = next_index.fetch_add(1, Ordering::Relaxed);
                        if index >= count {
                            break;
                        }
                        let value = f(index);
                        results.lock().expect("Poisoned lock!")[index] = Some(value);
                    }
                })
                .expect("Failed to spawn a worker thread");
        }
    });

    results
        .into_inner()
        .expect("Poisoned lock!")
        .into_iter()
        .map(|value| value.expect("Every index was claimed by some worker"))
        .collect()
}
