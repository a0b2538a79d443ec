use super::error::{ProbeError, WatchError};

/// Failure bookkeeping for a single wait
#[derive(Debug)]
pub struct WaitState {
    consecutive_failures: usize,
    max_consecutive_failures: usize,
}

impl WaitState {
    pub fn new(max_consecutive_failures: usize) -> WaitState {
        WaitState {
            consecutive_failures: 0,
            max_consecutive_failures,
        }
    }

    pub fn failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Count a failed attempt and return its 1-based number.
    pub fn report_failure(&mut self) -> usize {
        // usize is big enough to hold the failures
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    pub fn is_exhausted(&self) -> bool {
        self.consecutive_failures >= self.max_consecutive_failures
    }

    pub fn into_limit_error(self, last: ProbeError) -> WatchError {
        WatchError::LimitReached {
            limit: self.max_consecutive_failures,
            source: last,
        }
    }

    pub fn into_cancelled_error(self) -> WatchError {
        WatchError::Cancelled {
            failures: self.consecutive_failures,
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new() {
        let state = WaitState::new(3);
        assert_eq!(state.failures(), 0);
        assert!(!state.is_exhausted());
    }

    #[test]
    fn report_failure() {
        let mut state = WaitState::new(2);
        assert_eq!(state.report_failure(), 1);
        assert!(!state.is_exhausted());
        assert_eq!(state.report_failure(), 2);
        assert!(state.is_exhausted());
    }

    #[test]
    fn zero_limit_exhausts_on_first_failure() {
        let mut state = WaitState::new(0);
        state.report_failure();
        assert!(state.is_exhausted());
    }

    #[test]
    fn into_limit_error() {
        let mut state = WaitState::new(1);
        state.report_failure();
        match state.into_limit_error(ProbeError::other("down")) {
            WatchError::LimitReached { limit, source } => {
                assert_eq!(limit, 1);
                assert_eq!(source.to_string(), "down");
            }
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn into_cancelled_error() {
        let mut state = WaitState::new(5);
        state.report_failure();
        assert!(matches!(
            state.into_cancelled_error(),
            WatchError::Cancelled { failures: 1 }
        ));
    }
}
