use crate::engine::PerformanceStats;
use crate::generator::pool::CharPool;
use crate::generator::{PoolSource, WordSource};

/// Total extra pool entries a character with error rate 1.0 would receive,
/// spread over the size of the base pool.
pub const DEFAULT_ADAPT_VALUE: f64 = 60.0;

/// Steers any pool-based source toward the typist's weak characters.
///
/// Before each line the base pool is copied and every character that has
/// been missed is appended `ceil(error_rate * adapt_factor)` more times. Only
/// characters of the base pool are boosted, so whitespace or newline errors
/// never leak into generated words.
pub struct AdaptiveWordSource<S: PoolSource> {
    inner: S,
    adapt_factor: f64,
}

impl<S: PoolSource> AdaptiveWordSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_adapt_value(inner, DEFAULT_ADAPT_VALUE)
    }

    pub fn with_adapt_value(inner: S, adapt_value: f64) -> Self {
        let base_len = inner.pool().len().max(1);
        Self {
            inner,
            adapt_factor: adapt_value / base_len as f64,
        }
    }

    pub fn adapt_factor(&self) -> f64 {
        self.adapt_factor
    }

    pub fn adapted_pool(&self, stats: &PerformanceStats) -> CharPool {
        let base = self.inner.pool();
        let mut pool = base.clone();
        for (ch, rate) in stats.iter() {
            if !base.contains(ch) {
                continue;
            }
            let boost = (rate.error_rate() * self.adapt_factor).ceil() as usize;
            pool.push_n(ch, boost);
        }
        pool
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: PoolSource> WordSource for AdaptiveWordSource<S> {
    fn create(&mut self, max_len: usize, stats: &PerformanceStats) -> String {
        let pool = self.adapted_pool(stats);
        self.inner.create_from_pool(&pool, max_len)
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn stop(&mut self) {
        self.inner.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::assert_line_contract;
    use crate::generator::language::language_lines;
    use crate::generator::random::{RandomLines, UniformWords};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn adaptive_ab(seed: u64) -> AdaptiveWordSource<RandomLines<UniformWords>> {
        let inner =
            RandomLines::uniform(CharPool::from_chars("ab"), SmallRng::seed_from_u64(seed)).unwrap();
        AdaptiveWordSource::new(inner)
    }

    fn b_share(src: &mut AdaptiveWordSource<RandomLines<UniformWords>>, stats: &PerformanceStats) -> f64 {
        let mut letters = 0usize;
        let mut bs = 0usize;
        while letters < 5000 {
            for ch in src.create(80, stats).chars() {
                match ch {
                    'a' => letters += 1,
                    'b' => {
                        letters += 1;
                        bs += 1;
                    }
                    _ => {}
                }
            }
        }
        bs as f64 / letters as f64
    }

    #[test]
    fn test_adapt_factor_normalized_by_pool_size() {
        let src = adaptive_ab(1);
        assert!((src.adapt_factor() - DEFAULT_ADAPT_VALUE / 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_errors_keeps_uniform_mix() {
        let mut src = adaptive_ab(3);
        let share = b_share(&mut src, &PerformanceStats::new());
        assert!((share - 0.5).abs() < 0.05, "b share {share}");
    }

    #[test]
    fn test_max_error_rate_boosts_weak_char() {
        let mut stats = PerformanceStats::new();
        stats.add_error('a');
        let mut src = adaptive_ab(4);

        let pool = src.adapted_pool(&stats);
        assert_eq!(pool.count('a'), 1 + 30);
        assert_eq!(pool.count('b'), 1);

        let expected = 1.0 / (1.0 + src.adapt_factor());
        let share = b_share(&mut src, &stats);
        assert!((share - expected).abs() < 0.03, "b share {share}, expected {expected}");
    }

    #[test]
    fn test_chars_outside_base_pool_are_not_boosted() {
        let mut stats = PerformanceStats::new();
        stats.add_error(' ');
        stats.add_error('\n');
        stats.add_error('z');
        let src = adaptive_ab(5);
        assert_eq!(src.adapted_pool(&stats), CharPool::from_chars("ab"));
    }

    #[test]
    fn test_wraps_language_source() {
        let inner = language_lines(
            CharPool::from_chars("abcABC.,"),
            SmallRng::seed_from_u64(8),
        )
        .unwrap();
        let mut src = AdaptiveWordSource::new(inner);
        let mut stats = PerformanceStats::new();
        stats.add_error('C');
        stats.add_hit('a');
        for max_len in 0..60 {
            assert_line_contract(&src.create(max_len, &stats), max_len);
        }
        assert!(src.adapted_pool(&stats).count('C') > 1);
    }
}
