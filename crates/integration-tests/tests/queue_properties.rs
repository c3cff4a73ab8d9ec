//! Invariant checks for the admission queue exercised against the in-memory
//! store. Each test drives a randomized-free but adversarial sequence and
//! asserts a single structural property afterwards.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use turnstile_core::application::AdmissionQueue;
use turnstile_core::domain::PromotionPolicy;
use turnstile_core::port::member_store::memory::MemoryMemberStore;
use turnstile_core::port::{OrderedMemberStore, TimeProvider};

struct MockTimeProvider {
    current_time: AtomicI64,
}

impl MockTimeProvider {
    fn new(start: i64) -> Self {
        Self {
            current_time: AtomicI64::new(start),
        }
    }

    fn advance(&self, delta_ms: i64) {
        self.current_time.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_millis(&self) -> i64 {
        self.current_time.load(Ordering::SeqCst)
    }
}

struct Fixture {
    queue: AdmissionQueue,
    wait: Arc<MemoryMemberStore>,
    active: Arc<MemoryMemberStore>,
    clock: Arc<MockTimeProvider>,
}

fn make_queue(policy: PromotionPolicy) -> Fixture {
    let wait = Arc::new(MemoryMemberStore::new());
    let active = Arc::new(MemoryMemberStore::new());
    let clock = Arc::new(MockTimeProvider::new(1_000_000));
    let queue = AdmissionQueue::new("order", policy, wait.clone(), active.clone(), clock.clone());
    Fixture {
        queue,
        wait,
        active,
        clock,
    }
}

async fn assert_disjoint(fx: &Fixture) {
    let waiting = fx.wait.range_ascending(0, 1_000).await.unwrap();
    let active = fx.active.range_ascending(0, 1_000).await.unwrap();
    for token in &waiting {
        assert!(
            !active.contains(token),
            "token {} is in both wait and active sets",
            token
        );
    }
}

/// No token is ever a member of both sets, across register, promote,
/// re-register and release.
#[tokio::test]
async fn test_wait_and_active_sets_disjoint() {
    let fx = make_queue(PromotionPolicy::capacity(2).unwrap());

    for token in ["a", "b", "c", "d"] {
        fx.queue.register(token).await.unwrap();
        fx.clock.advance(1);
        assert_disjoint(&fx).await;
    }

    fx.queue.promote().await.unwrap();
    assert_disjoint(&fx).await;

    // re-registering an active member must not re-enqueue it
    fx.queue.register("a").await.unwrap();
    assert_disjoint(&fx).await;
    assert_eq!(fx.queue.status("a").await.unwrap().rank, 0);

    fx.queue.release("a").await.unwrap();
    fx.queue.promote().await.unwrap();
    assert_disjoint(&fx).await;
}

/// Promotion drains the wait set in strict enqueue order across ticks.
#[tokio::test]
async fn test_promotion_is_fifo() {
    let fx = make_queue(PromotionPolicy::rate(2).unwrap());

    let tokens = ["t1", "t2", "t3", "t4", "t5"];
    for token in tokens {
        fx.queue.register(token).await.unwrap();
        fx.clock.advance(1);
    }

    let mut admitted = Vec::new();
    while admitted.len() < tokens.len() {
        admitted.extend(fx.queue.promote().await.unwrap());
    }
    let expected: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    assert_eq!(admitted, expected);
}

/// A capacity queue never admits beyond max_capacity even under repeated
/// ticks and interleaved registrations.
#[tokio::test]
async fn test_capacity_bound_holds() {
    let fx = make_queue(PromotionPolicy::capacity(3).unwrap());

    for i in 0..10 {
        fx.queue.register(&format!("u{}", i)).await.unwrap();
        fx.clock.advance(1);
        fx.queue.promote().await.unwrap();
        let (_, active) = fx.queue.counts().await.unwrap();
        assert!(active <= 3, "active count {} exceeds capacity", active);
    }

    let (waiting, active) = fx.queue.counts().await.unwrap();
    assert_eq!(active, 3);
    assert_eq!(waiting, 7);

    // a release frees exactly one slot
    fx.queue.release("u0").await.unwrap();
    fx.queue.promote().await.unwrap();
    let (_, active) = fx.queue.counts().await.unwrap();
    assert_eq!(active, 3);
}

/// Registering the same token repeatedly keeps its original position.
#[tokio::test]
async fn test_register_is_idempotent() {
    let fx = make_queue(PromotionPolicy::capacity(1).unwrap());

    fx.queue.register("first").await.unwrap();
    fx.clock.advance(10);
    fx.queue.register("second").await.unwrap();
    fx.clock.advance(10);

    // late duplicate must not push "first" behind "second"
    fx.queue.register("first").await.unwrap();

    assert_eq!(fx.queue.status("first").await.unwrap().rank, 1);
    assert_eq!(fx.queue.status("second").await.unwrap().rank, 2);
    assert_eq!(fx.queue.promote().await.unwrap(), vec!["first".to_string()]);
}

/// Release is idempotent and leaves unrelated members alone.
#[tokio::test]
async fn test_release_is_idempotent() {
    let fx = make_queue(PromotionPolicy::capacity(2).unwrap());

    fx.queue.register("a").await.unwrap();
    fx.clock.advance(1);
    fx.queue.register("b").await.unwrap();
    fx.queue.promote().await.unwrap();

    fx.queue.release("a").await.unwrap();
    fx.queue.release("a").await.unwrap();

    let (waiting, active) = fx.queue.counts().await.unwrap();
    assert_eq!((waiting, active), (0, 1));
    assert!(fx.queue.status("b").await.unwrap().allowed);
}

/// Eviction removes exactly the members whose lease lapsed, never fresher
/// ones, regardless of how many are active.
#[tokio::test]
async fn test_eviction_is_selective() {
    let fx = make_queue(PromotionPolicy::rate(10).unwrap());

    fx.queue.register("old").await.unwrap();
    fx.queue.promote().await.unwrap();

    fx.clock.advance(500_000);
    fx.queue.register("fresh").await.unwrap();
    fx.queue.promote().await.unwrap();

    fx.clock.advance(200_000);
    // "old" is 700s stale, "fresh" only 200s
    assert_eq!(fx.queue.evict_stale(600_000).await.unwrap(), 1);

    assert_eq!(fx.queue.status("old").await.unwrap().rank, -1);
    assert!(fx.queue.status("fresh").await.unwrap().allowed);
}

/// Rank reported to waiters is dense and 1-based even as the queue drains.
#[tokio::test]
async fn test_waiting_ranks_stay_dense() {
    let fx = make_queue(PromotionPolicy::capacity(1).unwrap());

    for token in ["a", "b", "c"] {
        fx.queue.register(token).await.unwrap();
        fx.clock.advance(1);
    }
    fx.queue.promote().await.unwrap();

    assert_eq!(fx.queue.status("b").await.unwrap().rank, 1);
    assert_eq!(fx.queue.status("c").await.unwrap().rank, 2);

    fx.queue.release("a").await.unwrap();
    fx.queue.promote().await.unwrap();
    assert_eq!(fx.queue.status("c").await.unwrap().rank, 1);
}
