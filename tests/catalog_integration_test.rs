//! End-to-end demonstration over the seeded catalog: the naive strategy
//! performs two extra fetches per book, the scoped loaders perform one bulk
//! fetch per relation, and both produce identical data.

use std::sync::Arc;

use futures::future::join_all;

use loader_core::catalog::{
    resolve_page_naive, CatalogScope, CatalogStore, AUTHOR_BY_ID, REVIEWS_BY_BOOK_ID,
};
use loader_core::{FlushCounter, LoaderConfig};

fn scope_over(store: &Arc<CatalogStore>, counter: &Arc<FlushCounter>) -> CatalogScope {
    CatalogScope::new(
        Arc::clone(store),
        Arc::clone(counter) as Arc<dyn loader_core::FlushObserver>,
        LoaderConfig::default(),
    )
}

#[test]
fn naive_resolution_exhibits_n_plus_one() {
    let store = CatalogStore::seeded();
    store.reset_fetch_count();

    let page = resolve_page_naive(&store, 10, 0);

    assert_eq!(page.len(), 10);
    // 1 page fetch + 10 author fetches + 10 review fetches.
    assert_eq!(store.fetch_count(), 21);
}

#[tokio::test]
async fn coalesced_resolution_uses_one_fetch_per_relation() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);
    store.reset_fetch_count();

    let page = scope.books_page_with_relations(10, 0).await.unwrap();

    assert_eq!(page.len(), 10);
    // 1 page fetch + 1 bulk author fetch + 1 bulk review fetch.
    assert_eq!(store.fetch_count(), 3);
    assert_eq!(counter.flushes(), 2);
    assert_eq!(counter.flushes_for(AUTHOR_BY_ID), 1);
    assert_eq!(counter.flushes_for(REVIEWS_BY_BOOK_ID), 1);
}

#[tokio::test]
async fn both_strategies_resolve_identical_data() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);

    let naive = resolve_page_naive(&store, 30, 0);
    let coalesced = scope.books_page_with_relations(30, 0).await.unwrap();

    assert_eq!(naive, coalesced);
    // Every book has an author and the seed gives every book reviews.
    for resolved in &coalesced {
        assert!(resolved.author.is_some());
        assert!(!resolved.reviews.is_empty());
        assert!(resolved.average_rating.is_some());
    }
}

#[tokio::test]
async fn repeated_page_in_same_scope_is_cache_served() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);

    scope.books_page_with_relations(10, 0).await.unwrap();
    assert_eq!(counter.flushes(), 2);
    store.reset_fetch_count();

    scope.books_page_with_relations(10, 0).await.unwrap();

    // Only the page listing itself hits the store again.
    assert_eq!(store.fetch_count(), 1);
    assert_eq!(counter.flushes(), 2);
}

#[tokio::test]
async fn fresh_scope_fetches_again() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());

    let first = scope_over(&store, &counter);
    first.books_page_with_relations(10, 0).await.unwrap();
    drop(first);

    let second = scope_over(&store, &counter);
    second.books_page_with_relations(10, 0).await.unwrap();

    // No cross-request caching: each scope flushed each relation once.
    assert_eq!(counter.flushes(), 4);
    assert_eq!(counter.flushes_for(AUTHOR_BY_ID), 2);
}

#[tokio::test]
async fn absent_author_resolves_to_none_not_error() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);

    let (missing, present) = tokio::join!(scope.author(999), scope.author(1));
    assert_eq!(missing.unwrap(), None);
    assert_eq!(present.unwrap().map(|a| a.name), Some("Isaac Asimov".to_string()));
}

#[tokio::test]
async fn author_shelves_coalesce_in_one_burst() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);
    store.reset_fetch_count();

    let shelves = join_all([1, 2, 10].map(|id| scope.books_for_author(id))).await;

    let sizes: Vec<usize> = shelves
        .into_iter()
        .map(|shelf| shelf.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![4, 3, 2]);
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn resolved_page_serializes_for_transport_layers() {
    let store = Arc::new(CatalogStore::seeded());
    let counter = Arc::new(FlushCounter::new());
    let scope = scope_over(&store, &counter);

    let page = scope.books_page_with_relations(2, 0).await.unwrap();
    let value = serde_json::to_value(&page).unwrap();

    assert_eq!(value[0]["book"]["title"], "Foundation");
    assert_eq!(value[0]["author"]["name"], "Isaac Asimov");
    assert!(value[0]["average_rating"].is_number());
}
