//! Property-based checks over generated inputs

use morphic_core::{EngineBuilder, EnumMap};
use morphic_reflect::EnumRepr;
use morphic_test_utils::{catalog, setup_test_engine, Address, Color, Person, PersonDto, Shade};
use proptest::prelude::*;

fn color() -> impl Strategy<Value = Color> {
    prop::sample::select(Color::variants().to_vec())
}

fn address() -> impl Strategy<Value = Option<Address>> {
    prop::option::of(("[a-z0-9 ]{0,12}", "[A-Za-z]{1,10}").prop_map(|(street, city)| Address { street, city }))
}

proptest! {
    #[test]
    fn transform_preserves_matched_members(
        id in any::<u64>(),
        name in "[a-zA-Z ]{0,16}",
        age in any::<u32>(),
        favorite in color(),
        address in address(),
    ) {
        let engine = setup_test_engine();
        let source = Person {
            entity: morphic_test_utils::Entity { id },
            name: name.clone(),
            age,
            favorite,
            address: address.clone(),
        };

        let dto: PersonDto = engine.transform(&source).unwrap();

        prop_assert_eq!(dto.entity.id, id);
        prop_assert_eq!(dto.entity.revision, 0);
        prop_assert_eq!(dto.name, name);
        prop_assert_eq!(dto.age, i64::from(age));
        prop_assert_eq!(dto.favorite, favorite.name());
        prop_assert_eq!(dto.address.map(|a| (a.street, a.city)), address.map(|a| (a.street, a.city)));
    }

    #[test]
    fn merge_then_transform_agree(id in any::<u64>(), name in "[a-z]{0,8}", age in any::<u32>()) {
        let engine = setup_test_engine();
        let source = Person {
            entity: morphic_test_utils::Entity { id },
            name,
            age,
            ..Person::default()
        };

        let transformed: PersonDto = engine.transform(&source).unwrap();
        let mut merged = PersonDto::default();
        engine.merge(&source, &mut merged).unwrap();
        prop_assert_eq!(transformed, merged);
    }

    #[test]
    fn enum_names_round_trip_through_text(color in color()) {
        let engine = EngineBuilder::new(catalog()).build().unwrap();
        let text: String = engine.transform(&color).unwrap();
        let back: Color = engine.transform(&text).unwrap();
        prop_assert_eq!(back, color);
    }

    #[test]
    fn enum_discriminants_round_trip_through_integers(color in color()) {
        let engine = EngineBuilder::new(catalog()).build().unwrap();
        let n: i32 = engine.transform(&color).unwrap();
        prop_assert_eq!(i64::from(n), color.discriminant());
        let back: Color = engine.transform(&n).unwrap();
        prop_assert_eq!(back, color);
    }

    #[test]
    fn explicit_map_wins_only_for_listed_values(color in color()) {
        let engine = EngineBuilder::new(catalog())
            .conversion_map(EnumMap::<Color, Shade>::new().entry(Color::Red, Shade::Black))
            .build()
            .unwrap();
        let shade: Shade = engine.transform(&color).unwrap();
        let expected = if color == Color::Red {
            Shade::Black
        } else {
            Shade::from_name(color.name()).unwrap()
        };
        prop_assert_eq!(shade, expected);
    }
}
