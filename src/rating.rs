//! Par times and star ratings for completed levels.

/// Supplies the target time and star count recorded with each level result.
pub trait RatingPolicy {
    /// Target completion time in seconds for a level of the given size.
    fn par_time(&self, level: u32, size: usize) -> u64;

    /// Stars earned for finishing in `time` seconds against `par_time`.
    fn stars(&self, time: u64, par_time: u64) -> u8;
}

/// Two seconds of par per grid row; three stars at or under par, two within
/// double par, one otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRating;

impl RatingPolicy for DefaultRating {
    fn par_time(&self, _level: u32, size: usize) -> u64 {
        size as u64 * 2
    }

    fn stars(&self, time: u64, par_time: u64) -> u8 {
        if time <= par_time {
            3
        } else if time <= par_time.saturating_mul(2) {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_par_time_scales_with_size() {
        let rating = DefaultRating;
        assert_eq!(rating.par_time(1, 11), 22);
        assert_eq!(rating.par_time(5, 27), 54);
    }

    #[test]
    fn test_default_stars_thresholds() {
        let rating = DefaultRating;
        assert_eq!(rating.stars(0, 22), 3);
        assert_eq!(rating.stars(22, 22), 3);
        assert_eq!(rating.stars(23, 22), 2);
        assert_eq!(rating.stars(44, 22), 2);
        assert_eq!(rating.stars(45, 22), 1);
    }
}
