//! Interleaved fan-out of elementwise array computations.
//!
//! `[0, len)` is split into `width` strides `{s, s + width, s + 2 * width, ..}`.
//! Every stride is computed by one job into its own buffer, so jobs never
//! touch the same index, and the buffers are woven back together in index
//! order once the whole batch finished. The output therefore does not depend
//! on scheduling.

use std::sync::Arc;

use super::pool::{Job, WorkerPool};
use crate::error::Result;

/// Elementwise mapping used by chart elements: `(item, index, all_items) -> value`.
pub type Mapper<D, V> = Arc<dyn Fn(&D, usize, &[D]) -> V + Send + Sync>;

pub fn mapper<D, V, F>(f: F) -> Mapper<D, V>
where
    F: Fn(&D, usize, &[D]) -> V + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn fan_out<V, F>(pool: &WorkerPool, width: usize, len: usize, f: F) -> Result<Vec<V>>
where
    V: Send,
    F: Fn(usize) -> V + Sync,
{
    let mut output = Vec::new();
    fan_out_into(pool, width, len, &mut output, f)?;
    Ok(output)
}

/// Same as [`fan_out`] but reuses `output`'s allocation. The buffer is cleared first.
pub fn fan_out_into<V, F>(
    pool: &WorkerPool,
    width: usize,
    len: usize,
    output: &mut Vec<V>,
    f: F,
) -> Result<()>
where
    V: Send,
    F: Fn(usize) -> V + Sync,
{
    output.clear();
    if len == 0 {
        return Ok(());
    }

    let slices = width.clamp(1, len);
    let mut strides: Vec<Vec<V>> = (0..slices)
        .map(|start| Vec::with_capacity(stride_len(len, slices, start)))
        .collect();

    let f = &f;
    let jobs: Vec<Job<'_>> = strides
        .iter_mut()
        .enumerate()
        .map(|(start, buf)| {
            Box::new(move || buf.extend((start..len).step_by(slices).map(f))) as Job<'_>
        })
        .collect();
    pool.submit_all(jobs)?;

    output.reserve(len);
    let mut strides: Vec<_> = strides.into_iter().map(Vec::into_iter).collect();
    'weave: loop {
        for stride in strides.iter_mut() {
            match stride.next() {
                Some(value) => output.push(value),
                None => break 'weave,
            }
        }
    }
    Ok(())
}

/// Number of indices in the stride starting at `start`.
fn stride_len(len: usize, slices: usize, start: usize) -> usize {
    (len - start).div_ceil(slices)
}

/// Maps every item of `data` through `mapper` on `pool`.
pub fn fan_out_map<D, V>(
    pool: &WorkerPool,
    width: usize,
    data: &[D],
    mapper: &Mapper<D, V>,
) -> Result<Vec<V>>
where
    D: Sync,
    V: Send,
{
    fan_out(pool, width, data.len(), |i| mapper(&data[i], i, data))
}
