use std::time::Duration;

use super::*;
use crate::{
    browse::Phase,
    fixtures::{post, sample_posts, FakeSource, Gate},
};

async fn wait_for_discards(controller: &RemoteCollectionController, expected: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.discarded_responses() < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("stale response should be processed");
}

fn item_ids(state: &BrowseState) -> Vec<i64> {
    state.items().iter().map(|post| post.id.0).collect()
}

#[tokio::test]
async fn pages_through_95_posts() {
    let source = FakeSource::new(sample_posts(95));
    let controller = RemoteCollectionController::new(source, 10);

    controller.load_page(1);
    let state = controller.settled().await;
    assert_eq!(state.items().len(), 10);
    assert_eq!(state.total_pages(), 10);
    assert_eq!(state.page(), 1);
    assert_eq!(state.phase(), Phase::Loaded);

    controller.next_page().expect("page 2 available");
    let state = controller.settled().await;
    assert_eq!(state.page(), 2);
    assert_eq!(item_ids(&state), (11..=20).collect::<Vec<_>>());

    controller.previous_page().expect("page 1 available");
    assert_eq!(controller.settled().await.page(), 1);
    assert_eq!(controller.previous_page(), None);
}

#[tokio::test]
async fn operations_return_before_the_fetch_completes() {
    let source = FakeSource::new(sample_posts(20));
    let release = source.hold(Gate::Page(1)).await;
    let controller = RemoteCollectionController::new(source, 10);

    let token = controller.load_page(1);
    let state = controller.snapshot();
    assert!(state.is_loading());
    assert_eq!(state.latest_request(), token);
    assert!(state.is_empty());

    release.send(()).expect("release");
    assert_eq!(controller.settled().await.items().len(), 10);
}

#[tokio::test]
async fn slow_first_page_cannot_overwrite_second() {
    let source = FakeSource::new(sample_posts(95));
    let release_first = source.hold(Gate::Page(1)).await;
    let controller = RemoteCollectionController::new(source, 10);

    let r1 = controller.load_page(1);
    let r2 = controller.load_page(2);
    assert!(r2 > r1);

    let after_r2 = controller.settled().await;
    assert_eq!(after_r2.page(), 2);

    release_first.send(()).expect("release");
    wait_for_discards(&controller, 1).await;

    let state = controller.snapshot();
    assert_eq!(state, after_r2);
    assert_eq!(item_ids(&state), (11..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn slow_search_cannot_overwrite_cleared_listing() {
    let source = FakeSource::new(sample_posts(95));
    let release_search = source.hold(Gate::All).await;
    let controller = RemoteCollectionController::new(source, 10);

    controller.search("title 9");
    controller.clear_search();
    let cleared = controller.settled().await;
    assert!(!cleared.is_searching());

    release_search.send(()).expect("release");
    wait_for_discards(&controller, 1).await;

    let state = controller.snapshot();
    assert!(!state.is_searching());
    assert_eq!(state.last_query(), "");
    assert_eq!(item_ids(&state), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn search_returns_exactly_the_matching_posts() {
    let mut posts = sample_posts(20);
    posts.push(post(21, "Thinking in React", "lorem"));
    posts.push(post(22, "Rust", "a React-free zone"));
    posts.push(post(23, "REACTOR pattern", "ipsum"));
    let controller = RemoteCollectionController::new(FakeSource::new(posts), 10);

    controller.search("react");
    let state = controller.settled().await;
    assert!(state.is_searching());
    assert_eq!(state.total_pages(), 1);
    assert_eq!(state.page(), 1);
    assert_eq!(item_ids(&state), vec![21, 22, 23]);
    assert_eq!(controller.next_page(), None);
}

#[tokio::test]
async fn blank_search_and_clear_search_agree() {
    async fn prepared() -> Arc<RemoteCollectionController> {
        let controller = RemoteCollectionController::new(FakeSource::new(sample_posts(95)), 10);
        controller.load_page(3);
        controller.settled().await;
        controller.search("title 4");
        controller.settled().await;
        controller
    }

    let via_search = prepared().await;
    via_search.search("  ");
    let via_clear = prepared().await;
    via_clear.clear_search();

    let a = via_search.settled().await;
    let b = via_clear.settled().await;
    assert_eq!(a, b);
    assert_eq!(a.page(), 1);
    assert!(!a.is_searching());
}

#[tokio::test]
async fn failure_is_surfaced_and_retry_recovers() {
    let source = FakeSource::new(sample_posts(30));
    source.set_failing(true);
    let controller = RemoteCollectionController::new(Arc::clone(&source) as Arc<dyn PostSource>, 10);

    controller.load_page(1);
    let state = controller.settled().await;
    assert_eq!(state.phase(), Phase::Errored);
    assert!(state.is_empty());
    assert!(state.error().expect("error").contains("503"));

    source.set_failing(false);
    controller.retry();
    let state = controller.settled().await;
    assert_eq!(state.phase(), Phase::Loaded);
    assert_eq!(state.error(), None);
    assert_eq!(state.items().len(), 10);
}

#[tokio::test]
async fn failed_page_change_keeps_previous_items() {
    let source = FakeSource::new(sample_posts(30));
    let controller = RemoteCollectionController::new(Arc::clone(&source) as Arc<dyn PostSource>, 10);
    controller.load_page(1);
    controller.settled().await;

    source.set_failing(true);
    controller.next_page().expect("page 2");
    let state = controller.settled().await;
    assert!(state.error().is_some());
    assert_eq!(item_ids(&state), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn paging_while_searching_issues_no_fetch() {
    let source = FakeSource::new(sample_posts(95));
    let controller = RemoteCollectionController::new(Arc::clone(&source) as Arc<dyn PostSource>, 10);
    controller.search("title");
    let before = controller.settled().await;
    let calls = source.calls();

    assert_eq!(controller.next_page(), None);
    assert_eq!(controller.previous_page(), None);
    assert_eq!(source.calls(), calls);
    assert_eq!(controller.snapshot(), before);
}

#[tokio::test]
async fn subscribers_see_loading_then_result() {
    let source = FakeSource::new(sample_posts(5));
    let release = source.hold(Gate::Page(1)).await;
    let controller = RemoteCollectionController::new(source, 10);
    let mut rx = controller.subscribe();

    controller.load_page(1);
    rx.changed().await.expect("loading notification");
    assert!(rx.borrow_and_update().is_loading());

    release.send(()).expect("release");
    rx.changed().await.expect("result notification");
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.items().len(), 5);
    assert!(!state.shows_pagination());
}

#[tokio::test]
async fn source_lookup_is_available_outside_the_state_machine() {
    let controller = RemoteCollectionController::new(FakeSource::new(sample_posts(5)), 10);
    let post = controller
        .source()
        .fetch_post(shared::domain::PostId(3))
        .await
        .expect("post");
    assert_eq!(post.title, "post title 3");
    assert_eq!(controller.snapshot().phase(), Phase::Idle);
}

#[tokio::test]
async fn missing_total_count_collapses_to_one_page() {
    let controller = RemoteCollectionController::new(FakeSource::without_total(sample_posts(95)), 10);
    controller.load_page(1);
    let state = controller.settled().await;
    assert_eq!(state.total_pages(), 1);
    assert_eq!(state.items().len(), 10);
    assert_eq!(controller.next_page(), None);
}

#[tokio::test]
async fn settled_returns_immediately_when_nothing_is_in_flight() {
    let controller = RemoteCollectionController::new(FakeSource::new(sample_posts(5)), 10);
    let state = tokio::time::timeout(Duration::from_secs(1), controller.settled())
        .await
        .expect("idle controller settles at once");
    assert_eq!(state.phase(), Phase::Idle);
}

#[tokio::test]
async fn failed_jump_keeps_pagination_of_the_shown_page() {
    let source = FakeSource::new(sample_posts(95));
    let controller = RemoteCollectionController::new(Arc::clone(&source) as Arc<dyn PostSource>, 10);
    controller.load_page(1);
    controller.settled().await;

    source.set_failing(true);
    controller.load_page(50);
    let state = controller.settled().await;
    assert!(state.error().is_some());
    assert_eq!((state.page(), state.total_pages()), (1, 10));
    assert_eq!(controller.previous_page(), None);

    source.set_failing(false);
    controller.next_page().expect("page 2");
    assert_eq!(controller.settled().await.page(), 2);
}
