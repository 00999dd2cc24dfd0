use crate::Parallelism;

/// Runs `op(idx)` for every `idx` in `0..n_tasks`, on the calling thread or on the rayon pool
/// depending on `parallelism`.
///
/// Tasks must write to disjoint memory, the serial and parallel executions are then
/// indistinguishable.
#[inline]
pub fn for_each_raw(n_tasks: usize, op: impl Send + Sync + Fn(usize), parallelism: Parallelism) {
    // monomorphized once, whatever the closure type
    fn run(n_tasks: usize, op: &(dyn Send + Sync + Fn(usize)), parallelism: Parallelism) {
        let n_threads = parallelism_degree(parallelism);
        if n_tasks <= 1 || n_threads <= 1 {
            (0..n_tasks).for_each(op);
            return;
        }

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            (0..n_tasks)
                .into_par_iter()
                .with_min_len(n_tasks / n_threads)
                .for_each(op);
        }
        #[cfg(not(feature = "rayon"))]
        (0..n_tasks).for_each(op);
    }
    run(n_tasks, &op, parallelism)
}

/// Raw pointer that can be moved into tasks. Each task must only access its own part of the
/// pointee.
pub struct Ptr<T>(pub *mut T);

unsafe impl<T> Send for Ptr<T> {}
unsafe impl<T> Sync for Ptr<T> {}

impl<T> Clone for Ptr<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Ptr<T> {}

/// Number of threads that `parallelism` asks for.
#[inline]
pub fn parallelism_degree(parallelism: Parallelism) -> usize {
    match parallelism {
        Parallelism::None => 1,
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(0) => rayon::current_num_threads(),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n_threads) => n_threads,
    }
}

/// Splits `0..n` into `chunk_count` contiguous chunks whose sizes differ by at most one, and
/// returns `(start, len)` of the chunk `idx`.
///
/// The first `n % chunk_count` chunks hold the extra element.
#[inline]
pub fn par_split_indices(n: usize, idx: usize, chunk_count: usize) -> (usize, usize) {
    let base = n / chunk_count;
    let extra = n % chunk_count;
    let start = idx * base + Ord::min(idx, extra);
    let len = base + (idx < extra) as usize;
    (start, len)
}

/// Number of tasks to split `n` independent units of work into, given the amount of work per
/// unit.
#[inline]
pub(crate) fn task_count(n: usize, work_per_unit: usize, parallelism: Parallelism) -> usize {
    const MIN_WORK_PER_TASK: usize = 32 * 1024;

    let degree = parallelism_degree(parallelism);
    if degree <= 1 || n <= 1 {
        return Ord::min(n, 1);
    }
    let total = n.saturating_mul(work_per_unit);
    let by_work = Ord::max(total / MIN_WORK_PER_TASK, 1);
    Ord::min(Ord::min(degree, by_work), n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_split_covers_range() {
        let n = 17;
        let chunks = 5;
        let mut next = 0;
        for idx in 0..chunks {
            let (start, len) = par_split_indices(n, idx, chunks);
            assert_eq!(start, next);
            next = start + len;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn test_for_each_visits_every_task() {
        let sum = AtomicUsize::new(0);
        for_each_raw(
            10,
            |i| {
                sum.fetch_add(i, Ordering::Relaxed);
            },
            crate::get_global_parallelism(),
        );
        assert_eq!(sum.load(Ordering::Relaxed), 45);
    }

    #[test]
    fn test_split_sizes_are_balanced() {
        assert_eq!(par_split_indices(10, 0, 4), (0, 3));
        assert_eq!(par_split_indices(10, 1, 4), (3, 3));
        assert_eq!(par_split_indices(10, 2, 4), (6, 2));
        assert_eq!(par_split_indices(10, 3, 4), (8, 2));
        assert_eq!(par_split_indices(2, 3, 4), (2, 0));
    }

    #[test]
    fn test_task_count_serial() {
        assert_eq!(task_count(100, 1 << 20, Parallelism::None), 1);
        assert_eq!(task_count(0, 1 << 20, Parallelism::None), 0);
    }
}
