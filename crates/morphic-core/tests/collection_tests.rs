//! Collection transforms and reconciling merges

use morphic_core::{
    DefinitionBuilder, EngineBuilder, IdenticalNameStrategy, MappingError, Merge, MergeResult, RegistrationError, Transform,
};
use morphic_reflect::{CollectionKind, TypeKey, Value};
use morphic_test_utils::{catalog, setup_test_engine, Address, AddressDto, Color};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_engine(calls: &Arc<AtomicUsize>) -> morphic_core::Engine {
    let mut catalog = catalog();
    catalog
        .register_vec::<u32>()
        .register_vec::<i64>()
        .register_vec_deque::<i64>();
    let counter = Arc::clone(calls);
    EngineBuilder::new(catalog)
        .mapping(Transform::typed(move |n: &u32, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(i64::from(*n))
        }))
        .build()
        .unwrap()
}

#[test]
fn value_element_merge_is_idempotent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);
    let source: Vec<u32> = vec![1, 2, 3];
    let mut target: Vec<i64> = vec![9, 9];

    for round in 1..=3 {
        engine.merge(&source, &mut target).unwrap();
        assert_eq!(target, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3 * round);
    }
}

#[test]
fn transforms_into_a_different_collection_family() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);

    let target: VecDeque<i64> = engine.transform(&vec![4_u32, 5]).unwrap();
    assert_eq!(target, VecDeque::from(vec![4, 5]));
}

#[test]
fn empty_source_clears_target_without_resolving_elements() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);
    let mut target: Vec<i64> = vec![1];

    engine.merge(&Vec::<u32>::new(), &mut target).unwrap();
    assert!(target.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn reference_elements_merge_into_matching_targets() {
    let engine = setup_test_engine();
    let source = vec![
        Address {
            street: "1 Main".to_string(),
            city: "new".to_string(),
        },
        Address {
            street: "2 Elm".to_string(),
            city: "fresh".to_string(),
        },
    ];
    let mut target = vec![
        AddressDto {
            street: "gone".to_string(),
            city: "x".to_string(),
        },
        AddressDto {
            street: "1 Main".to_string(),
            city: "old".to_string(),
        },
    ];

    engine.merge(&source, &mut target).unwrap();

    assert_eq!(
        target,
        vec![
            AddressDto {
                street: "1 Main".to_string(),
                city: "new".to_string(),
            },
            AddressDto {
                street: "2 Elm".to_string(),
                city: "fresh".to_string(),
            },
        ]
    );
}

fn address(street: &str, city: &str) -> Address {
    Address {
        street: street.to_string(),
        city: city.to_string(),
    }
}

fn address_dto(street: &str, city: &str) -> AddressDto {
    AddressDto {
        street: street.to_string(),
        city: city.to_string(),
    }
}

fn rejected(to: TypeKey) -> MappingError {
    MappingError::ConversionFailed {
        from: TypeKey::of::<u32>(),
        to,
        reason: "rejected".to_string(),
    }
}

#[test]
fn failed_value_element_leaves_target_untouched() {
    let mut catalog = catalog();
    catalog.register_vec::<u32>().register_vec::<i64>();
    let engine = EngineBuilder::new(catalog)
        .mapping(Transform::typed(|n: &u32, _ctx| {
            if *n == 2 {
                return Err(rejected(TypeKey::of::<i64>()));
            }
            Ok(i64::from(*n))
        }))
        .build()
        .unwrap();
    let mut target: Vec<i64> = vec![9, 8];

    let err = engine.merge(&vec![1_u32, 2, 3], &mut target).unwrap_err();

    assert_eq!(err, rejected(TypeKey::of::<i64>()));
    assert_eq!(target, vec![9, 8]);
}

#[test]
fn failed_reference_element_leaves_target_untouched() {
    let engine = EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Address, AddressDto>::new()
                .auto(IdenticalNameStrategy::new())
                .build(),
        )
        .mapping(Transform::typed(|a: &Address, _ctx| {
            if a.city == "bad" {
                return Err(rejected(TypeKey::of::<AddressDto>()));
            }
            Ok(address_dto(&a.street, &a.city))
        }))
        .target_finder::<Address, AddressDto, String>(|a| a.street.clone(), |a| a.street.clone())
        .build()
        .unwrap();
    let original = vec![address_dto("1 Main", "old"), address_dto("gone", "x")];
    let mut target = original.clone();

    let err = engine
        .merge(&vec![address("1 Main", "new"), address("2 Elm", "bad")], &mut target)
        .unwrap_err();

    assert_eq!(err, rejected(TypeKey::of::<AddressDto>()));
    assert_eq!(target, original);
}

#[test]
fn replacing_element_merge_swaps_the_slot() {
    let engine = EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Address, AddressDto>::new()
                .auto(IdenticalNameStrategy::new())
                .build(),
        )
        .mapping(Merge::new(
            TypeKey::of::<Address>(),
            TypeKey::of::<AddressDto>(),
            |source, _target, _ctx| {
                let source = source.and_then(|s| s.downcast_ref::<Address>());
                Ok(MergeResult::replace(
                    source.map(|a| Box::new(address_dto(&a.street, &format!("swapped {}", a.city))) as Value),
                ))
            },
        ))
        .target_finder::<Address, AddressDto, String>(|a| a.street.clone(), |a| a.street.clone())
        .build()
        .unwrap();
    let mut target = vec![address_dto("1 Main", "old")];

    engine
        .merge(&vec![address("1 Main", "new"), address("2 Elm", "fresh")], &mut target)
        .unwrap();

    assert_eq!(
        target,
        vec![address_dto("1 Main", "swapped new"), address_dto("2 Elm", "fresh")]
    );
}

#[test]
fn enum_elements_convert() {
    let engine = EngineBuilder::new(catalog()).build().unwrap();
    let names: Vec<String> = engine.transform(&vec![Color::Red, Color::Blue]).unwrap();
    assert_eq!(names, vec!["Red".to_string(), "Blue".to_string()]);
}

#[test]
fn abstract_list_resolves_to_vec() {
    let engine = EngineBuilder::new(catalog()).build().unwrap();
    let value = engine
        .transform_into(&vec![Color::Green], CollectionKind::List, TypeKey::of::<String>())
        .unwrap()
        .unwrap();
    assert_eq!(value.downcast_ref::<Vec<String>>(), Some(&vec!["Green".to_string()]));
}

#[test]
fn abstract_set_without_instantiation_is_reported() {
    let engine = EngineBuilder::new(catalog()).build().unwrap();
    let err = engine
        .transform_into(&vec![Color::Green], CollectionKind::Set, TypeKey::of::<String>())
        .unwrap_err();
    assert_eq!(
        err,
        MappingError::UnregisteredCollection {
            kind: CollectionKind::Set,
            element: TypeKey::of::<String>(),
        }
    );
}

#[test]
fn collection_registration_is_validated_at_build() {
    let err = EngineBuilder::new(catalog())
        .collection_type(CollectionKind::Set, "Vec")
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        MappingError::Registration(RegistrationError::NotImplemented { .. })
    ));

    let engine = EngineBuilder::new(catalog())
        .collection_type(CollectionKind::Sequence, "VecDeque")
        .build()
        .unwrap();
    let err = engine
        .collection_type(CollectionKind::Sequence, TypeKey::of::<String>())
        .unwrap_err();
    assert!(matches!(err, MappingError::UnregisteredCollection { .. }));
}
