//! Schema data model: declared types, field schemas, class schemas.
//!
//! Schemas are immutable once registered; the codec engines only ever read
//! them. The declarative construction surface lives in [`builder`].

pub(crate) mod builder;

pub use builder::{ClassBuilder, FieldDef};

use std::any::TypeId;
use std::borrow::Cow;

use serde_json::Value;

use crate::access::{DecodedValue, FieldValue, Getter, Setter};
use crate::de::Reader;
use crate::error::CodecError;
use crate::reflect::Reflect;
use crate::ser::Writer;

// -----------------------------------------------------------------------------
// TypeRef

/// A declared type: the static type a field, collection element, or
/// top-level operation is typed against.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeRef {
    Bool,
    /// Any integer width; decoded values surface as `i64` (or `u64` beyond
    /// the signed range) and are width-adapted by the field setter.
    Int,
    Float,
    String,
    /// A calendar timestamp carried as an RFC 3339 string.
    Timestamp,
    /// A byte buffer carried as a single base64 token.
    Bytes,
    /// A registered (or registrable) class, keyed by its Rust type.
    Class(TypeId),
    /// No static constraint: the value is a raw structured tree.
    Dynamic,
}

impl TypeRef {
    /// The declared type matching a concrete Rust type: one of the built-in
    /// scalar mappings where `T` is a primitive, timestamp, byte buffer, or
    /// raw structured value, and a class reference otherwise.
    pub fn of<T: Reflect>() -> Self {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<bool>() {
            Self::Bool
        } else if is_int_id(id) {
            Self::Int
        } else if id == TypeId::of::<f32>() || id == TypeId::of::<f64>() {
            Self::Float
        } else if id == TypeId::of::<String>() {
            Self::String
        } else if id == TypeId::of::<chrono::DateTime<chrono::Utc>>() {
            Self::Timestamp
        } else if id == TypeId::of::<Vec<u8>>() {
            Self::Bytes
        } else if id == TypeId::of::<Value>() {
            Self::Dynamic
        } else {
            Self::Class(id)
        }
    }

    /// What the deserializer expects for this declared type, for diagnostics.
    pub(crate) fn expected(&self) -> &'static str {
        match self {
            Self::Bool => "a boolean",
            Self::Int => "an integer",
            Self::Float => "a float",
            Self::String => "a string",
            Self::Timestamp => "an RFC 3339 timestamp string",
            Self::Bytes => "a base64 string or a byte list",
            Self::Class(_) => "an object",
            Self::Dynamic => "a structured value",
        }
    }
}

fn is_int_id(id: TypeId) -> bool {
    [
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<usize>(),
    ]
    .contains(&id)
}

// -----------------------------------------------------------------------------
// CollectionKind

/// The collection shape of a field, if any.
///
/// `dims` counts nested structural levels: a list of lists of strings is
/// `Seq { dims: 2 }` with element type [`TypeRef::String`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollectionKind {
    None,
    /// An ordered sequence; element order is significant.
    Seq { dims: u32 },
    /// A unique-element collection; element order is not significant.
    Set { dims: u32 },
}

impl CollectionKind {
    /// Number of structural levels the codec recurses through.
    #[inline]
    pub(crate) fn dims(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Seq { dims } | Self::Set { dims } => *dims,
        }
    }
}

// -----------------------------------------------------------------------------
// KnownType

/// One explicitly declared known type of a class schema.
///
/// The name is captured at declaration time so an entry can participate in
/// tag resolution even while its schema has not been registered yet (the
/// soft-fail registration policy).
#[derive(Clone, Copy, Debug)]
pub struct KnownType {
    pub id: TypeId,
    pub name: &'static str,
}

// -----------------------------------------------------------------------------
// Hooks

/// Full override of the recursive serialization walk for one class.
pub type SerializeHook =
    Box<dyn Fn(&dyn Reflect, &Writer<'_>) -> Result<Value, CodecError> + Send + Sync>;

/// Full override of the recursive deserialization walk for one class.
pub type DeserializeHook =
    Box<dyn Fn(&Value, &Reader<'_>) -> Result<Box<dyn Reflect>, CodecError> + Send + Sync>;

/// Factory invoked with the raw structured value instead of default
/// construction plus field-by-field assignment. `Ok(None)` is an absent
/// result.
pub type Initializer =
    Box<dyn Fn(&Value, &Reader<'_>) -> Result<Option<Box<dyn Reflect>>, CodecError> + Send + Sync>;

/// Default-construction factory for a class.
pub type Construct = fn() -> Box<dyn Reflect>;

// -----------------------------------------------------------------------------
// FieldSchema

/// One declared member of a class: its wire metadata plus the erased
/// accessor pair bridging the concrete Rust field.
pub struct FieldSchema {
    pub(crate) def: FieldDef,
    pub(crate) getter: Getter,
    pub(crate) setter: Setter,
}

impl FieldSchema {
    /// The field's key in the structured value.
    #[inline]
    pub fn json_name(&self) -> &str {
        &self.def.json_name
    }

    /// Declared type of the field, or of the innermost collection element.
    #[inline]
    pub fn ty(&self) -> TypeRef {
        self.def.ty
    }

    /// The field's collection shape.
    #[inline]
    pub fn collection(&self) -> CollectionKind {
        self.def.collection
    }

    /// Whether absent input for this field aborts decoding.
    #[inline]
    pub fn required(&self) -> bool {
        self.def.required
    }

    /// Explicit sort position; unordered fields sort after all ordered ones.
    #[inline]
    pub fn order(&self) -> Option<i32> {
        self.def.order
    }

    /// Whether the declared type's zero value is written out instead of
    /// being suppressed.
    #[inline]
    pub fn emit_default(&self) -> bool {
        self.def.emit_default
    }

    /// Reads the field off an instance as a borrowed view.
    #[inline]
    pub(crate) fn view<'a>(&self, instance: &'a dyn Reflect) -> FieldValue<'a> {
        (self.getter)(instance)
    }

    /// Stores a decoded value into an instance.
    #[inline]
    pub(crate) fn assign(
        &self,
        instance: &mut dyn Reflect,
        value: DecodedValue,
    ) -> Result<(), CodecError> {
        (self.setter)(instance, value)
    }
}

impl std::fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.def.fmt(f)
    }
}

// -----------------------------------------------------------------------------
// ClassSchema

/// The registered, immutable description of one class: its serializable
/// fields, polymorphic known types, and optional hooks.
pub struct ClassSchema {
    pub(crate) owner: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) display_name: Cow<'static, str>,
    pub(crate) parent: Option<TypeId>,
    /// Sorted: ordered fields first (ascending), unordered fields after,
    /// alphabetically by JSON name among themselves.
    pub(crate) fields: Vec<FieldSchema>,
    pub(crate) known_types: Vec<KnownType>,
    pub(crate) construct: Option<Construct>,
    pub(crate) initializer: Option<Initializer>,
    pub(crate) serialize_with: Option<SerializeHook>,
    pub(crate) deserialize_with: Option<DeserializeHook>,
}

impl ClassSchema {
    /// The Rust type this schema describes.
    #[inline]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    /// Full path of the owner type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The name discriminators carry for this class.
    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The parent class, when this schema was registered with one.
    #[inline]
    pub fn parent(&self) -> Option<TypeId> {
        self.parent
    }

    /// Fields in schema (sorted) order, inherited ones included.
    #[inline]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Explicit known-type entries, inherited ones included.
    #[inline]
    pub fn known_types(&self) -> &[KnownType] {
        &self.known_types
    }

    #[inline]
    pub(crate) fn construct(&self) -> Option<Construct> {
        self.construct
    }

    #[inline]
    pub(crate) fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }

    #[inline]
    pub(crate) fn serialize_with(&self) -> Option<&SerializeHook> {
        self.serialize_with.as_ref()
    }

    #[inline]
    pub(crate) fn deserialize_with(&self) -> Option<&DeserializeHook> {
        self.deserialize_with.as_ref()
    }
}

impl std::fmt::Debug for ClassSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassSchema")
            .field("type_name", &self.type_name)
            .field("display_name", &self.display_name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
