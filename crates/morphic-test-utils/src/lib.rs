//! Testing utilities for the morphic workspace
//!
//! Shared fixtures: a small domain model, its DTO mirror, and a catalog
//! describing both.

#![allow(missing_docs)]

use morphic_core::{DefinitionBuilder, Engine, EngineBuilder, IdenticalNameStrategy};
use morphic_reflect::{EnumRepr, TypeCatalog, TypeDescriptor};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Red = 1,
    Green = 2,
    Blue = 3,
}

impl EnumRepr for Color {
    fn variants() -> &'static [Self] {
        &[Color::Red, Color::Green, Color::Blue]
    }

    fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
        }
    }

    fn discriminant(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Shade {
    #[default]
    Black = 0,
    Red = 10,
    Green = 20,
    Blue = 30,
}

impl EnumRepr for Shade {
    fn variants() -> &'static [Self] {
        &[Shade::Black, Shade::Red, Shade::Green, Shade::Blue]
    }

    fn name(self) -> &'static str {
        match self {
            Shade::Black => "Black",
            Shade::Red => "Red",
            Shade::Green => "Green",
            Shade::Blue => "Blue",
        }
    }

    fn discriminant(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDto {
    pub id: u64,
    pub revision: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressDto {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub entity: Entity,
    pub name: String,
    pub age: u32,
    pub favorite: Color,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonDto {
    pub entity: EntityDto,
    pub name: String,
    pub age: i64,
    pub favorite: String,
    pub address: Option<AddressDto>,
}

/// Catalog describing every fixture type, plus `Vec`s of the record types
pub fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .register_enum::<Color>()
        .register_enum::<Shade>()
        .register(
            TypeDescriptor::builder::<Entity>()
                .constructor(Entity::default)
                .field("id", |e: &Entity| &e.id, |e: &mut Entity| &mut e.id)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<EntityDto>()
                .constructor(EntityDto::default)
                .field("id", |e: &EntityDto| &e.id, |e: &mut EntityDto| &mut e.id)
                .field("revision", |e: &EntityDto| &e.revision, |e: &mut EntityDto| &mut e.revision)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Address>()
                .constructor(Address::default)
                .field("street", |a: &Address| &a.street, |a: &mut Address| &mut a.street)
                .field("city", |a: &Address| &a.city, |a: &mut Address| &mut a.city)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<AddressDto>()
                .constructor(AddressDto::default)
                .field("street", |a: &AddressDto| &a.street, |a: &mut AddressDto| &mut a.street)
                .field("city", |a: &AddressDto| &a.city, |a: &mut AddressDto| &mut a.city)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<Person>()
                .constructor(Person::default)
                .base(|p: &Person| &p.entity, |p: &mut Person| &mut p.entity)
                .field("name", |p: &Person| &p.name, |p: &mut Person| &mut p.name)
                .field("age", |p: &Person| &p.age, |p: &mut Person| &mut p.age)
                .field("favorite", |p: &Person| &p.favorite, |p: &mut Person| &mut p.favorite)
                .optional_field("address", |p: &Person| &p.address, |p: &mut Person| &mut p.address)
                .build(),
        )
        .register(
            TypeDescriptor::builder::<PersonDto>()
                .constructor(PersonDto::default)
                .base(|p: &PersonDto| &p.entity, |p: &mut PersonDto| &mut p.entity)
                .field("name", |p: &PersonDto| &p.name, |p: &mut PersonDto| &mut p.name)
                .field("age", |p: &PersonDto| &p.age, |p: &mut PersonDto| &mut p.age)
                .field("favorite", |p: &PersonDto| &p.favorite, |p: &mut PersonDto| &mut p.favorite)
                .optional_field("address", |p: &PersonDto| &p.address, |p: &mut PersonDto| &mut p.address)
                .build(),
        )
        .register_vec::<Address>()
        .register_vec::<AddressDto>()
        .register_vec::<Person>()
        .register_vec::<PersonDto>()
        .register_vec::<Color>()
        .register_vec::<String>();
    catalog
}

pub fn person(id: u64, name: &str) -> Person {
    Person {
        entity: Entity { id },
        name: name.to_string(),
        age: 30,
        favorite: Color::Green,
        address: Some(Address {
            street: format!("{id} Main St"),
            city: "Springfield".to_string(),
        }),
    }
}

/// Engine with name-matching definitions for every fixture pair
pub fn setup_test_engine() -> Engine {
    EngineBuilder::new(catalog())
        .definition(
            DefinitionBuilder::<Entity, EntityDto>::new()
                .auto(IdenticalNameStrategy::new())
                .build(),
        )
        .definition(
            DefinitionBuilder::<Address, AddressDto>::new()
                .auto(IdenticalNameStrategy::new())
                .build(),
        )
        .definition(
            DefinitionBuilder::<Person, PersonDto>::new()
                .inherits::<Entity, EntityDto>()
                .auto(IdenticalNameStrategy::new())
                .build(),
        )
        .target_finder::<Address, AddressDto, String>(|a| a.street.clone(), |a| a.street.clone())
        .build()
        .unwrap()
}

/// Route engine logs to the test harness; honours `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
