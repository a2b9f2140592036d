//! Schema-driven JSON serialization that keeps runtime type identity.
//!
//! Classes are described once, in code, through a [`ClassBuilder`] and stored
//! in a [`SchemaRegistry`]. A [`Codec`] then encodes instances to JSON text
//! and decodes text back into instances, resolving polymorphism through a
//! discriminator member (`"__type"` by default): a value whose runtime type
//! matches its declared type is written plain, while a subtype in a
//! supertype-declared position carries its registered display name so the
//! decoder can reconstruct the concrete type.
//!
//! ```
//! use polyjson::{ClassBuilder, Codec, FieldDef, SchemaRegistry, TypeRef, impl_reflect};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//! }
//! impl_reflect!(Person);
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         ClassBuilder::<Person>::new()
//!             .field(
//!                 FieldDef::scalar("firstName", TypeRef::String),
//!                 |p: &Person| Some(&p.first_name),
//!                 |p, v| p.first_name = v,
//!             )
//!             .field(
//!                 FieldDef::scalar("lastName", TypeRef::String),
//!                 |p: &Person| Some(&p.last_name),
//!                 |p, v| p.last_name = v,
//!             ),
//!     )
//!     .unwrap();
//!
//! let codec = Codec::new(&registry);
//! let ada = Person { first_name: "Ada".into(), last_name: "Lovelace".into() };
//! let text = codec.encode(&ada).unwrap();
//! assert_eq!(codec.decode::<Person>(&text).unwrap(), ada);
//! ```

mod access;
mod codec;
mod config;
pub mod de;
mod error;
mod reflect;
mod registry;
mod resolve;
mod scalar;
mod schema;
pub mod ser;

#[cfg(test)]
pub(crate) mod fixtures;

pub use access::{DecodedValue, FieldValue, Getter, Setter};
pub use codec::Codec;
pub use config::{CodecConfig, DEFAULT_TYPE_HINT_KEY};
pub use de::Reader;
pub use error::{CodecError, SchemaError};
pub use reflect::{AsReflect, FromReflect, Reflect};
pub use registry::{SchemaRegistry, SchemaRegistryArc};
pub use schema::{
    ClassBuilder, ClassSchema, CollectionKind, Construct, DeserializeHook, FieldDef, FieldSchema,
    Initializer, KnownType, SerializeHook, TypeRef,
};
pub use ser::Writer;
