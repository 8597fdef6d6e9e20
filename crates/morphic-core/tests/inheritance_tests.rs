//! Inherited fragments across multi-level base chains

use morphic_core::{DefinitionBuilder, EngineBuilder, IdenticalNameStrategy, MappingError};
use morphic_reflect::{TypeCatalog, TypeDescriptor, TypeKey};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Default, PartialEq)]
struct Level3 {
    x: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Level3Dto {
    label: String,
    tag: String,
    log: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Level2 {
    base: Level3,
    y: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Level2Dto {
    base: Level3Dto,
    y: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Level1 {
    base: Level2,
    z: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Level1Dto {
    base: Level2Dto,
    z: u32,
}

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .register(
            TypeDescriptor::builder::<Level3>()
                .field("x", |s: &Level3| &s.x, |s: &mut Level3| &mut s.x)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Level3Dto>()
                .constructor(Level3Dto::default)
                .field("label", |t: &Level3Dto| &t.label, |t: &mut Level3Dto| &mut t.label)
                .field("tag", |t: &Level3Dto| &t.tag, |t: &mut Level3Dto| &mut t.tag)
                .field("log", |t: &Level3Dto| &t.log, |t: &mut Level3Dto| &mut t.log)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Level2>()
                .base(|s: &Level2| &s.base, |s: &mut Level2| &mut s.base)
                .field("y", |s: &Level2| &s.y, |s: &mut Level2| &mut s.y)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Level2Dto>()
                .constructor(Level2Dto::default)
                .base(|t: &Level2Dto| &t.base, |t: &mut Level2Dto| &mut t.base)
                .field("y", |t: &Level2Dto| &t.y, |t: &mut Level2Dto| &mut t.y)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Level1>()
                .base(|s: &Level1| &s.base, |s: &mut Level1| &mut s.base)
                .field("z", |s: &Level1| &s.z, |s: &mut Level1| &mut s.z)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Level1Dto>()
                .constructor(Level1Dto::default)
                .base(|t: &Level1Dto| &t.base, |t: &mut Level1Dto| &mut t.base)
                .field("z", |t: &Level1Dto| &t.z, |t: &mut Level1Dto| &mut t.z)
                .build(),
        );
    catalog
}

fn engine_builder() -> EngineBuilder {
    EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Level3, Level3Dto>::new()
                .map("label", |s: &Level3| format!("x={}", s.x))
                .map("tag", |_: &Level3| "d3".to_string())
                .on_completed(|_, t: &mut Level3Dto, _| {
                    t.log.push('3');
                    Ok(())
                })
                .build(),
        )
        .definition(
            DefinitionBuilder::<Level2, Level2Dto>::new()
                .inherits::<Level3, Level3Dto>()
                .map("tag", |s: &Level2| format!("d2:{}", s.y))
                .map_from("y", "y")
                .on_completed(|_, t: &mut Level2Dto, _| {
                    t.base.log.push('2');
                    Ok(())
                })
                .build(),
        )
}

fn level1(x: u32, y: u32, z: u32) -> Level1 {
    Level1 {
        base: Level2 { base: Level3 { x }, y },
        z,
    }
}

#[test]
fn inheritance_is_transitive_and_ordered() {
    let engine = engine_builder()
        .definition(
            DefinitionBuilder::<Level1, Level1Dto>::new()
                .inherits::<Level2, Level2Dto>()
                .auto(IdenticalNameStrategy::new())
                .on_completed(|_, t: &mut Level1Dto, _| {
                    t.base.base.log.push('1');
                    Ok(())
                })
                .build(),
        )
        .build()
        .unwrap();

    let dto: Level1Dto = engine.transform(&level1(7, 5, 9)).unwrap();

    assert_eq!(
        dto,
        Level1Dto {
            base: Level2Dto {
                base: Level3Dto {
                    label: "x=7".to_string(),
                    tag: "d2:5".to_string(),
                    log: "321".to_string(),
                },
                y: 5,
            },
            z: 9,
        }
    );
}

#[test]
fn derived_fragment_overrides_every_base() {
    let engine = engine_builder()
        .definition(
            DefinitionBuilder::<Level1, Level1Dto>::new()
                .inherits::<Level2, Level2Dto>()
                .map("label", |s: &Level1| format!("z={}", s.z))
                .map("tag", |_: &Level1| "d1".to_string())
                .build(),
        )
        .build()
        .unwrap();

    let dto: Level1Dto = engine.transform(&level1(1, 2, 3)).unwrap();
    assert_eq!(dto.base.base.label, "z=3");
    assert_eq!(dto.base.base.tag, "d1");
    assert_eq!(dto.base.y, 2);
    assert_eq!(dto.z, 0);
}

#[test]
fn not_inherited_fragments_stay_with_their_pair() {
    let engine = EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Level3, Level3Dto>::new()
                .not_inherited()
                .map("label", |_: &Level3| "base only".to_string())
                .map("tag", |_: &Level3| "shared".to_string())
                .build(),
        )
        .definition(
            DefinitionBuilder::<Level2, Level2Dto>::new()
                .inherits::<Level3, Level3Dto>()
                .build(),
        )
        .build()
        .unwrap();

    let dto: Level2Dto = engine
        .transform(&Level2 {
            base: Level3 { x: 0 },
            y: 0,
        })
        .unwrap();
    assert_eq!(dto.base.label, "");
    assert_eq!(dto.base.tag, "shared");

    let direct: Level3Dto = engine.transform(&Level3 { x: 0 }).unwrap();
    assert_eq!(direct.label, "base only");
}

#[test]
fn cyclic_inheritance_is_rejected() {
    let engine = EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Level1, Level1Dto>::new()
                .inherits::<Level2, Level2Dto>()
                .build(),
        )
        .definition(
            DefinitionBuilder::<Level2, Level2Dto>::new()
                .inherits::<Level1, Level1Dto>()
                .build(),
        )
        .build()
        .unwrap();

    let err = engine
        .transformer(TypeKey::of::<Level1>(), TypeKey::of::<Level1Dto>())
        .unwrap_err();
    let MappingError::CyclicInheritance { chain } = &err else {
        panic!("expected cyclic inheritance, got {err:?}");
    };
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.first(), chain.last());
}

#[test]
fn base_without_embedding_is_incompatible() {
    let engine = EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Level1, Level3Dto>::new()
                .map("tag", |s: &Level1| s.z.to_string())
                .build(),
        )
        .definition(
            DefinitionBuilder::<Level3, Level1Dto>::new()
                .inherits::<Level1, Level3Dto>()
                .build(),
        )
        .build()
        .unwrap();

    let err = engine
        .transformer(TypeKey::of::<Level3>(), TypeKey::of::<Level1Dto>())
        .unwrap_err();
    assert!(matches!(err, MappingError::IncompatibleBase { .. }));
}
