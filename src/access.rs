use crate::error::CodecError;
use crate::reflect::Reflect;

// -----------------------------------------------------------------------------
// FieldValue

/// A borrowed view of one field of a class instance, produced by the field's
/// getter and consumed by the serializer.
///
/// Collections appear as [`List`](FieldValue::List) regardless of whether the
/// backing container is a sequence or a unique-element collection; nested
/// collections nest one `List` per dimension.
pub enum FieldValue<'a> {
    /// The field holds no value (`None`, or the accessor chose to skip it).
    Missing,
    /// A single value: a scalar, a timestamp, or a class instance.
    Value(&'a dyn Reflect),
    /// One structural level of a collection.
    List(Vec<FieldValue<'a>>),
}

// -----------------------------------------------------------------------------
// DecodedValue

/// The owned mirror of [`FieldValue`], produced by the deserializer and
/// consumed by the field's setter.
pub enum DecodedValue {
    /// A single decoded value.
    Value(Box<dyn Reflect>),
    /// One structural level of a decoded collection.
    List(Vec<DecodedValue>),
}

// -----------------------------------------------------------------------------
// Accessors

/// Erased field getter installed by the schema builder.
pub type Getter = Box<dyn for<'a> Fn(&'a dyn Reflect) -> FieldValue<'a> + Send + Sync>;

/// Erased field setter installed by the schema builder.
pub type Setter = Box<dyn Fn(&mut dyn Reflect, DecodedValue) -> Result<(), CodecError> + Send + Sync>;
