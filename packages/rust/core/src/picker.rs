//! Selection among canned replies.
//!
//! Several replies come from a pool (greetings, fallbacks). Which one is used
//! goes through [`ReplyPicker`] so tests can pin the choice.

use rand::Rng;

/// Chooses an index into a non-empty pool.
pub trait ReplyPicker: Send + Sync {
    /// Return an index in `0..len`. `len` is at least 1.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice, drawn independently per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl ReplyPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the same position, clamped to the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPicker(pub usize);

impl ReplyPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Pick one reply from `pool`. Pools are validated non-empty at load time;
/// an empty one yields an empty string.
pub fn choose<'a>(picker: &dyn ReplyPicker, pool: &'a [String]) -> &'a str {
    if pool.is_empty() {
        return "";
    }
    let idx = picker.pick(pool.len());
    pool.get(idx).unwrap_or(&pool[0])
}
