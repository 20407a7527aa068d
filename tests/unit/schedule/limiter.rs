use super::*;

#[test]
fn first_request_runs_immediately() {
    let mut rl = RateLimiter::new(Some(10.0));
    assert_eq!(rl.admit("a", 0.0), Some("a"));
    assert!(!rl.has_pending());
}

#[test]
fn requests_inside_window_collapse_into_one_trailing_call() {
    let mut rl = RateLimiter::new(Some(10.0));
    assert_eq!(rl.admit(1, 0.0), Some(1));
    rl.commit(0.0);
    assert_eq!(rl.admit(2, 10.0), None);
    assert_eq!(rl.admit(3, 20.0), None);
    assert_eq!(rl.admit(4, 30.0), None);
    assert_eq!(rl.next_due_ms(), Some(100.0));

    assert_eq!(rl.poll_trailing(99.0), None);
    assert_eq!(rl.poll_trailing(100.0), Some(4));
    rl.commit(100.0);
    assert_eq!(rl.poll_trailing(500.0), None);
}

#[test]
fn trailing_call_restarts_the_window() {
    let mut rl = RateLimiter::new(Some(10.0));
    rl.admit(1, 0.0);
    rl.commit(0.0);
    rl.admit(2, 50.0);
    assert_eq!(rl.poll_trailing(120.0), Some(2));
    rl.commit(120.0);
    assert_eq!(rl.admit(3, 150.0), None);
    assert_eq!(rl.admit(4, 220.0), Some(4));
    assert!(!rl.has_pending());
}

#[test]
fn admission_without_commit_leaves_the_window_open() {
    let mut rl = RateLimiter::new(Some(10.0));
    assert_eq!(rl.admit("skipped", 0.0), Some("skipped"));
    assert_eq!(rl.admit("next", 10.0), Some("next"));
    rl.commit(10.0);
    assert_eq!(rl.admit("late", 20.0), None);
    assert_eq!(rl.next_due_ms(), Some(110.0));
}

#[test]
fn unlocked_limiter_lets_everything_through_without_dropping_pending() {
    let mut rl = RateLimiter::new(Some(10.0));
    rl.admit(1, 0.0);
    rl.commit(0.0);
    rl.admit(2, 5.0);
    rl.lock(false);
    assert_eq!(rl.admit(9, 6.0), Some(9));
    rl.lock(true);
    assert_eq!(rl.poll_trailing(100.0), Some(2));
}

#[test]
fn no_fps_means_no_gating() {
    let mut rl = RateLimiter::new(None);
    for i in 0..5 {
        assert_eq!(rl.admit(i, 0.0), Some(i));
    }
    assert_eq!(rl.interval_ms(), None);
}
