//! Shared test model: a small class hierarchy plus a kitchen-sink profile.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::reflect::Reflect;
use crate::registry::SchemaRegistry;
use crate::schema::{ClassBuilder, FieldDef, TypeRef};

#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct Person {
    pub first_name: String,
    pub last_name: String,
}
crate::impl_reflect!(Person);

#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct Employee {
    pub first_name: String,
    pub last_name: String,
    pub salary: f64,
}
crate::impl_reflect!(Employee);

#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct Investor {
    pub first_name: String,
    pub last_name: String,
    pub shares: i64,
}
crate::impl_reflect!(Investor);

#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct Profile {
    pub id: i64,
    pub nick: String,
    pub tags: Vec<String>,
    pub scores: Vec<Vec<i64>>,
    pub roles: HashSet<String>,
    pub created: Option<DateTime<Utc>>,
    pub avatar: Option<Vec<u8>>,
}
crate::impl_reflect!(Profile);

#[derive(Default)]
pub(crate) struct Team {
    pub lead: Option<Box<dyn Reflect>>,
    pub members: Vec<Box<dyn Reflect>>,
}
crate::impl_reflect!(Team);

pub(crate) fn person(first: &str, last: &str) -> Person {
    Person {
        first_name: first.to_owned(),
        last_name: last.to_owned(),
    }
}

pub(crate) fn employee(first: &str, last: &str, salary: f64) -> Employee {
    Employee {
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        salary,
    }
}

pub(crate) fn investor(first: &str, last: &str, shares: i64) -> Investor {
    Investor {
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        shares,
    }
}

fn person_builder() -> ClassBuilder<Person> {
    ClassBuilder::<Person>::new()
        .field(
            FieldDef::scalar("firstName", TypeRef::String),
            |p: &Person| Some(&p.first_name),
            |p, v| p.first_name = v,
        )
        .field(
            FieldDef::scalar("lastName", TypeRef::String),
            |p: &Person| Some(&p.last_name),
            |p, v| p.last_name = v,
        )
}

/// A registry holding only `Person`, for schema-level tests.
pub(crate) fn person_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(person_builder()).unwrap();
    registry
}

/// The full fixture registry: the `Person` hierarchy, `Profile`, and `Team`.
pub(crate) fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            person_builder()
                .known_type::<Employee>()
                .known_type::<Investor>(),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::<Employee>::new()
                .parent::<Person>()
                .bind_field(
                    "firstName",
                    |e: &Employee| Some(&e.first_name),
                    |e, v| e.first_name = v,
                )
                .bind_field(
                    "lastName",
                    |e: &Employee| Some(&e.last_name),
                    |e, v| e.last_name = v,
                )
                .field(
                    FieldDef::scalar("salary", TypeRef::Float),
                    |e: &Employee| Some(&e.salary),
                    |e, v| e.salary = v,
                ),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::<Investor>::new()
                .parent::<Person>()
                .bind_field(
                    "firstName",
                    |i: &Investor| Some(&i.first_name),
                    |i, v| i.first_name = v,
                )
                .bind_field(
                    "lastName",
                    |i: &Investor| Some(&i.last_name),
                    |i, v| i.last_name = v,
                )
                .field(
                    FieldDef::scalar("shares", TypeRef::Int),
                    |i: &Investor| Some(&i.shares),
                    |i, v| i.shares = v,
                ),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::<Profile>::new()
                .field(
                    FieldDef::scalar("id", TypeRef::Int).required(),
                    |p: &Profile| Some(&p.id),
                    |p, v| p.id = v,
                )
                .field(
                    FieldDef::scalar("nick", TypeRef::String),
                    |p: &Profile| Some(&p.nick),
                    |p, v| p.nick = v,
                )
                .seq_field(
                    FieldDef::seq("tags", TypeRef::String),
                    |p: &Profile| Some(&p.tags),
                    |p, v| p.tags = v,
                )
                .seq2_field(
                    FieldDef::seq_dims("scores", TypeRef::Int, 2),
                    |p: &Profile| Some(&p.scores),
                    |p, v| p.scores = v,
                )
                .set_field(
                    FieldDef::set("roles", TypeRef::String),
                    |p: &Profile| Some(&p.roles),
                    |p, v| p.roles = v,
                )
                .field(
                    FieldDef::scalar("created", TypeRef::Timestamp),
                    |p: &Profile| p.created.as_ref(),
                    |p, v| p.created = Some(v),
                )
                .field(
                    FieldDef::scalar("avatar", TypeRef::Bytes),
                    |p: &Profile| p.avatar.as_ref(),
                    |p, v| p.avatar = Some(v),
                ),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::<Team>::new()
                .field(
                    FieldDef::scalar("lead", TypeRef::of::<Person>()),
                    |t: &Team| t.lead.as_ref(),
                    |t, v| t.lead = Some(v),
                )
                .seq_field(
                    FieldDef::seq("members", TypeRef::of::<Person>()),
                    |t: &Team| Some(&t.members),
                    |t, v| t.members = v,
                ),
        )
        .unwrap();
    registry
}
