//! Waiting for the site to reflect a mutation.
//!
//! A successful wp-cli call is never taken as proof that the change landed.
//! After a mutation the reconcilers wait and re-read; the value they record
//! is always the last one read back.

use crate::types::SettleConfig;
use std::thread;

/// Sleep for the first settle delay.
pub fn pause(config: &SettleConfig) {
    let delay = config.delay_for_poll(0);
    if !delay.is_zero() {
        log::debug!("waiting {delay:?} for the site to settle");
        thread::sleep(delay);
    }
}

/// Re-read state until `settled` accepts it or the polls run out.
///
/// Each poll sleeps (with backoff) and then calls `read`. Returns the last
/// observed value, which may still be unsettled. A read error aborts
/// immediately.
pub fn converge<T, E, F, P>(config: &SettleConfig, mut read: F, settled: P) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&T) -> bool,
{
    let polls = config.max_polls.max(1);
    let mut poll = 0;

    loop {
        let delay = config.delay_for_poll(poll);
        if !delay.is_zero() {
            log::debug!("waiting {delay:?} before re-reading (poll {})", poll + 1);
            thread::sleep(delay);
        }

        let observed = read()?;
        poll += 1;

        if settled(&observed) {
            log::debug!("settled after {poll} poll(s)");
            return Ok(observed);
        }
        if poll >= polls {
            log::debug!("not settled after {poll} poll(s), keeping last reading");
            return Ok(observed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::cell::Cell;

    #[test]
    fn test_converge_first_poll() {
        let config = SettleConfig::immediate().with_polls(5);
        let calls = Cell::new(0);

        let result: Result<bool> = converge(
            &config,
            || {
                calls.set(calls.get() + 1);
                Ok(true)
            },
            |active| *active,
        );

        assert!(result.unwrap());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_converge_eventually() {
        let config = SettleConfig::immediate().with_polls(5);
        let calls = Cell::new(0);

        let result: Result<bool> = converge(
            &config,
            || {
                calls.set(calls.get() + 1);
                Ok(calls.get() < 3)
            },
            |active| !*active,
        );

        assert!(!result.unwrap());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_converge_returns_last_observation() {
        let config = SettleConfig::immediate().with_polls(3);
        let calls = Cell::new(0);

        let result: Result<bool> = converge(
            &config,
            || {
                calls.set(calls.get() + 1);
                Ok(true)
            },
            |active| !*active,
        );

        // never settled: the last reading is reported, not the target
        assert!(result.unwrap());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_converge_single_poll_default() {
        let config = SettleConfig::immediate();
        let calls = Cell::new(0);

        let result: Result<bool> = converge(
            &config,
            || {
                calls.set(calls.get() + 1);
                Ok(true)
            },
            |active| !*active,
        );

        assert!(result.is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_converge_read_error() {
        let config = SettleConfig::immediate().with_polls(3);
        let calls = Cell::new(0);

        let result: Result<bool> = converge(
            &config,
            || {
                calls.set(calls.get() + 1);
                Err(Error::Io(std::io::Error::other("boom")))
            },
            |active| *active,
        );

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
