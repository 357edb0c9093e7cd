/// Bounded retry: run `attempt` up to `budget` times, returning the first
/// `Some`. `None` after the budget means the caller's fallback applies.
pub fn retry_until<T>(budget: usize, mut attempt: impl FnMut() -> Option<T>) -> Option<T> {
    for _ in 0..budget {
        if let Some(found) = attempt() {
            return Some(found);
        }
    }
    None
}

/// Attempts allowed before giving up on a fresh unique value or an unused
/// composite-key combination.
pub const RETRY_BUDGET: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_first_success() {
        let mut calls = 0;
        let result = retry_until(100, || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(result, Some(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhausts_budget() {
        let mut calls = 0;
        let result: Option<()> = retry_until(5, || {
            calls += 1;
            None
        });
        assert_eq!(result, None);
        assert_eq!(calls, 5);
    }
}
