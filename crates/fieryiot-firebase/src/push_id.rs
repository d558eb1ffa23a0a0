// Firebase push keys
//
// A push key is 20 characters: 8 encode the millisecond timestamp, 12 are
// random. Keys generated in the same millisecond increment the random part,
// so keys from one generator always sort in creation order.

use chrono::Utc;
use rand::Rng;
use std::sync::Mutex;

/// Alphabet in ASCII order, so lexicographic order matches numeric order
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct PushIdState {
    last_time: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generator of time-ordered unique record keys
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for the current time
    pub fn generate(&self) -> String {
        self.generate_at(Utc::now().timestamp_millis())
    }

    fn generate_at(&self, now_ms: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // Never step backwards, even if the wall clock does
        let now_ms = now_ms.max(state.last_time);
        let duplicate = now_ms == state.last_time;
        state.last_time = now_ms;

        if duplicate {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }

        let mut id = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time = now_ms;
        let mut time_chars = [0u8; TIME_CHARS];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(time % 64) as usize];
            time /= 64;
        }
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&i| PUSH_CHARS[i as usize] as char),
        );
        id
    }
}

/// Add one to a base-64 digit string, carrying from the right
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let key = PushIdGenerator::new().generate();

        assert_eq!(key.len(), 20);
        assert!(key.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_timestamp_prefix() {
        let generator = PushIdGenerator::new();

        assert_eq!(&generator.generate_at(0)[..8], "--------");
        assert_eq!(&generator.generate_at(1)[..8], "-------0");
        assert_eq!(&generator.generate_at(64)[..8], "------0-");
        assert_eq!(&generator.generate_at(65)[..8], "------00");
    }

    #[test]
    fn test_same_millisecond_keys_are_ordered() {
        let generator = PushIdGenerator::new();
        let keys: Vec<String> = (0..100).map(|_| generator.generate_at(1_700_000_000_000)).collect();

        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_keys_ordered_across_time_and_clock_skew() {
        let generator = PushIdGenerator::new();
        let a = generator.generate_at(1_700_000_000_000);
        let b = generator.generate_at(1_700_000_000_001);
        let c = generator.generate_at(1_699_999_999_000);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; RANDOM_CHARS];
        digits[RANDOM_CHARS - 1] = 63;
        digits[RANDOM_CHARS - 2] = 5;

        increment(&mut digits);

        assert_eq!(digits[RANDOM_CHARS - 1], 0);
        assert_eq!(digits[RANDOM_CHARS - 2], 6);
    }
}
