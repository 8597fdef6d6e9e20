//! Concurrent first access to the caching store

use morphic_core::{CachingStore, Mapping, MappingKind, MappingResult, MappingStore, Transform};
use morphic_reflect::TypeKey;
use morphic_test_utils::{person, setup_test_engine, Person, PersonDto};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

#[derive(Default)]
struct SlowCompiler {
    compiles: AtomicUsize,
}

impl MappingStore for SlowCompiler {
    fn resolve(&self, source: TypeKey, target: TypeKey, _kind: MappingKind) -> MappingResult<Option<Mapping>> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(Some(Transform::new(source, target, |_, _| Ok(None)).into()))
    }
}

#[test]
fn concurrent_first_resolution_compiles_once() {
    let inner = Arc::new(SlowCompiler::default());
    let store = CachingStore::new(Arc::clone(&inner));
    let barrier = Barrier::new(THREADS);
    let (from, to) = (TypeKey::of::<u8>(), TypeKey::of::<u16>());

    let mappings: Vec<Mapping> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    store.resolve(from, to, MappingKind::Transform).unwrap().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(inner.compiles.load(Ordering::SeqCst), 1);
    assert_eq!(mappings.len(), THREADS);
    assert!(mappings.iter().all(|m| m.ptr_eq(&mappings[0])));

    let stats = store.stats();
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn engine_is_shared_across_threads() {
    let engine = setup_test_engine();
    let barrier = Barrier::new(THREADS);

    let results: Vec<PersonDto> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let id = u64::try_from(i).unwrap();
                    engine.transform::<Person, PersonDto>(&person(id, "worker")).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, dto) in results.iter().enumerate() {
        assert_eq!(dto.entity.id, u64::try_from(i).unwrap());
    }
    let transform = engine
        .resolve(TypeKey::of::<Person>(), TypeKey::of::<PersonDto>(), MappingKind::Transform)
        .unwrap()
        .unwrap();
    let again = engine
        .resolve(TypeKey::of::<Person>(), TypeKey::of::<PersonDto>(), MappingKind::Transform)
        .unwrap()
        .unwrap();
    assert!(transform.ptr_eq(&again));
}
