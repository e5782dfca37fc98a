//! Uniqueness of allocated values under concurrency.

mod support;

use std::collections::HashSet;
use std::sync::Arc;

use ordinal::ArbitratedCounterStore;
use ordinal::CounterStore;
use ordinal::Document;
use ordinal::InMemoryCounterStore;
use ordinal::SequenceAllocator;
use ordinal::SequenceConfig;
use ordinal::SequencedModel;
use ordinal::SequencedRecord;
use proptest::prelude::*;
use support::collection::DocumentCollection;

async fn consume_concurrently<S>(allocator: Arc<SequenceAllocator<S>>, tasks: usize) -> Vec<i64>
where S: CounterStore + ?Sized + 'static {
    let mut handles = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let allocator = Arc::clone(&allocator);
        handles.push(tokio::spawn(async move { allocator.consume_next("Book", "_id").await.unwrap() }));
    }

    let mut values = Vec::with_capacity(tasks);
    for handle in handles {
        values.push(handle.await.unwrap());
    }
    values
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_consumers_get_distinct_values() {
    support::init_tracing();
    let allocator = Arc::new(ordinal::in_memory(Default::default()).unwrap());
    allocator.configure(SequenceConfig::for_owner("Book")).await.unwrap();

    let values = consume_concurrently(allocator, 200).await;

    let distinct: HashSet<i64> = values.iter().copied().collect();
    assert_eq!(distinct.len(), 200);
    assert_eq!(distinct, (0..200).collect::<HashSet<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_allocators_sharing_a_store_never_collide() {
    let store = InMemoryCounterStore::new();
    let first = Arc::new(SequenceAllocator::with_default_settings(Arc::clone(&store)));
    let second = Arc::new(SequenceAllocator::with_default_settings(Arc::clone(&store)));
    first.configure(SequenceConfig::for_owner("Book")).await.unwrap();
    second.configure(SequenceConfig::for_owner("Book")).await.unwrap();

    let (a, b) = tokio::join!(consume_concurrently(first, 100), consume_concurrently(second, 100));

    let distinct: HashSet<i64> = a.iter().chain(b.iter()).copied().collect();
    assert_eq!(distinct.len(), 200);
    assert_eq!(store.counters().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_saves_never_duplicate_keys() {
    let allocator = Arc::new(ordinal::in_memory(Default::default()).unwrap());
    let books = Arc::new(SequencedModel::attach(allocator, SequenceConfig::for_owner("Book")).await.unwrap());
    let docs = Arc::new(DocumentCollection::with_unique_field("_id"));

    let mut handles = Vec::new();
    for i in 0..64 {
        let books = Arc::clone(&books);
        let docs = Arc::clone(&docs);
        handles.push(tokio::spawn(async move {
            books.save(Document::new().with("n", i), docs.as_ref()).await.unwrap().sequence_value("_id")
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }
    assert_eq!(docs.documents("Book").await.len(), 64);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_values_are_pairwise_distinct(
        tasks in 1usize..64,
        start in -1_000i64..1_000,
        increment in prop_oneof![-10i64..=-1, 1i64..=10],
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread().worker_threads(4).enable_all().build().unwrap();
        let values = rt.block_on(async {
            let allocator = Arc::new(ordinal::in_memory(Default::default()).unwrap());
            allocator
                .configure(SequenceConfig::for_owner("Book").starting_at(start).incrementing_by(increment))
                .await
                .unwrap();
            consume_concurrently(allocator, tasks).await
        });

        let distinct: HashSet<i64> = values.iter().copied().collect();
        prop_assert_eq!(distinct.len(), tasks);
        let expected: HashSet<i64> = (0..tasks as i64).map(|i| start + i * increment).collect();
        prop_assert_eq!(distinct, expected);
    }

    #[test]
    fn test_arbitrated_table_values_are_pairwise_distinct(tasks in 1usize..48) {
        let rt = tokio::runtime::Builder::new_multi_thread().worker_threads(4).enable_all().build().unwrap();
        let values = rt.block_on(async {
            let store = Arc::new(ArbitratedCounterStore::with_queue_depth(InMemoryCounterStore::new(), 8));
            let allocator = Arc::new(SequenceAllocator::with_default_settings(store));
            allocator.configure(SequenceConfig::for_owner("Book")).await.unwrap();
            consume_concurrently(allocator, tasks).await
        });

        let distinct: HashSet<i64> = values.into_iter().collect();
        prop_assert_eq!(distinct, (0..tasks as i64).collect::<HashSet<i64>>());
    }
}
