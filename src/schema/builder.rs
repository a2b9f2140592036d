//! Declarative schema construction.
//!
//! A [`ClassBuilder`] assembles the complete description of one class — its
//! fields with typed accessors, known types, parent link, and hooks — and is
//! then consumed by [`SchemaRegistry::register`](crate::SchemaRegistry::register).
//! The codec core never observes this surface; it only reads the registered
//! [`ClassSchema`](crate::ClassSchema).

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::access::{DecodedValue, FieldValue, Getter, Setter};
use crate::error::CodecError;
use crate::reflect::{AsReflect, FromReflect, Reflect};
use crate::schema::{CollectionKind, Construct, DeserializeHook, FieldSchema};
use crate::schema::{Initializer, KnownType, SerializeHook, TypeRef};

// -----------------------------------------------------------------------------
// FieldDef

/// Wire metadata of one field, without accessors.
///
/// ```
/// use polyjson::{FieldDef, TypeRef};
///
/// let def = FieldDef::scalar("salary", TypeRef::Float).required();
/// let tags = FieldDef::seq("tags", TypeRef::String).order(1);
/// ```
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub(crate) json_name: Cow<'static, str>,
    pub(crate) ty: TypeRef,
    pub(crate) collection: CollectionKind,
    pub(crate) required: bool,
    pub(crate) order: Option<i32>,
    pub(crate) emit_default: bool,
}

impl FieldDef {
    fn new(json_name: impl Into<Cow<'static, str>>, ty: TypeRef, collection: CollectionKind) -> Self {
        Self {
            json_name: json_name.into(),
            ty,
            collection,
            required: false,
            order: None,
            emit_default: false,
        }
    }

    /// A plain (non-collection) field of the given declared type.
    pub fn scalar(json_name: impl Into<Cow<'static, str>>, ty: TypeRef) -> Self {
        Self::new(json_name, ty, CollectionKind::None)
    }

    /// An ordered sequence of `element` values.
    pub fn seq(json_name: impl Into<Cow<'static, str>>, element: TypeRef) -> Self {
        Self::new(json_name, element, CollectionKind::Seq { dims: 1 })
    }

    /// A nested ordered sequence, `dims` structural levels deep.
    pub fn seq_dims(json_name: impl Into<Cow<'static, str>>, element: TypeRef, dims: u32) -> Self {
        assert!(dims >= 1, "a collection has at least one dimension");
        Self::new(json_name, element, CollectionKind::Seq { dims })
    }

    /// A unique-element collection of `element` values.
    pub fn set(json_name: impl Into<Cow<'static, str>>, element: TypeRef) -> Self {
        Self::new(json_name, element, CollectionKind::Set { dims: 1 })
    }

    /// Marks the field as required on decode.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Gives the field an explicit sort position.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Emits the declared type's zero value instead of suppressing it.
    pub fn emit_default(mut self) -> Self {
        self.emit_default = true;
        self
    }
}

// -----------------------------------------------------------------------------
// ClassBuilder

pub(crate) struct Binding {
    pub(crate) name: Cow<'static, str>,
    pub(crate) getter: Getter,
    pub(crate) setter: Setter,
}

/// Assembles the schema of one class `C`.
///
/// ```
/// use polyjson::{ClassBuilder, FieldDef, SchemaRegistry, TypeRef, impl_reflect};
///
/// #[derive(Default)]
/// struct Person {
///     first_name: String,
///     last_name: String,
/// }
///
/// impl_reflect!(Person);
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register(
///         ClassBuilder::<Person>::new()
///             .field(
///                 FieldDef::scalar("firstName", TypeRef::String),
///                 |p: &Person| Some(&p.first_name),
///                 |p, v| p.first_name = v,
///             )
///             .field(
///                 FieldDef::scalar("lastName", TypeRef::String),
///                 |p: &Person| Some(&p.last_name),
///                 |p, v| p.last_name = v,
///             ),
///     )
///     .unwrap();
/// ```
pub struct ClassBuilder<C: Reflect> {
    pub(crate) display_name: Option<Cow<'static, str>>,
    pub(crate) parent: Option<(TypeId, &'static str)>,
    pub(crate) fields: Vec<FieldSchema>,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) known_types: Vec<KnownType>,
    pub(crate) construct: Option<Construct>,
    pub(crate) initializer: Option<Initializer>,
    pub(crate) serialize_with: Option<SerializeHook>,
    pub(crate) deserialize_with: Option<DeserializeHook>,
    pub(crate) marker: PhantomData<fn() -> C>,
}

impl<C: Reflect> ClassBuilder<C> {
    /// Starts a schema for a default-constructible class.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_factory(|| Box::new(C::default()))
    }

    /// Starts a schema with an explicit construction factory, for classes
    /// without a usable `Default`.
    pub fn with_factory(construct: Construct) -> Self {
        Self {
            display_name: None,
            parent: None,
            fields: Vec::new(),
            bindings: Vec::new(),
            known_types: Vec::new(),
            construct: Some(construct),
            initializer: None,
            serialize_with: None,
            deserialize_with: None,
            marker: PhantomData,
        }
    }

    /// Overrides the display name carried by discriminators (defaults to the
    /// short type name).
    pub fn display_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Links the parent class. Its fields and known types are copied into
    /// this schema at registration time; each copied field must be bound to
    /// accessors of `C` via one of the `bind_*` methods.
    pub fn parent<P: Reflect>(mut self) -> Self {
        self.parent = Some((TypeId::of::<P>(), std::any::type_name::<P>()));
        self
    }

    /// Declares a type that discriminators on fields of this class may
    /// resolve to.
    pub fn known_type<T: Reflect>(mut self) -> Self {
        self.known_types.push(KnownType {
            id: TypeId::of::<T>(),
            name: crate::reflect::short_type_name(std::any::type_name::<T>()),
        });
        self
    }

    /// Declares a plain field backed by accessors on `C`.
    ///
    /// For a polymorphic field, use `F = Box<dyn Reflect>` with a class
    /// element type in the [`FieldDef`].
    pub fn field<F: AsReflect + FromReflect + 'static>(
        mut self,
        def: FieldDef,
        get: fn(&C) -> Option<&F>,
        set: fn(&mut C, F),
    ) -> Self {
        let (getter, setter) = scalar_accessors(get, set);
        self.fields.push(FieldSchema { def, getter, setter });
        self
    }

    /// Declares an ordered-sequence field backed by a `Vec`.
    pub fn seq_field<E: AsReflect + FromReflect + 'static>(
        mut self,
        def: FieldDef,
        get: fn(&C) -> Option<&Vec<E>>,
        set: fn(&mut C, Vec<E>),
    ) -> Self {
        let (getter, setter) = seq_accessors(get, set);
        self.fields.push(FieldSchema { def, getter, setter });
        self
    }

    /// Declares a two-dimensional ordered-sequence field.
    pub fn seq2_field<E: AsReflect + FromReflect + 'static>(
        mut self,
        def: FieldDef,
        get: fn(&C) -> Option<&Vec<Vec<E>>>,
        set: fn(&mut C, Vec<Vec<E>>),
    ) -> Self {
        let (getter, setter) = seq2_accessors(get, set);
        self.fields.push(FieldSchema { def, getter, setter });
        self
    }

    /// Declares a unique-element-collection field backed by a `HashSet`.
    pub fn set_field<E: AsReflect + FromReflect + Eq + Hash + 'static>(
        mut self,
        def: FieldDef,
        get: fn(&C) -> Option<&HashSet<E>>,
        set: fn(&mut C, HashSet<E>),
    ) -> Self {
        let (getter, setter) = set_accessors(get, set);
        self.fields.push(FieldSchema { def, getter, setter });
        self
    }

    /// Declares a field with hand-written erased accessors, for collection
    /// shapes the typed helpers do not cover (three or more dimensions,
    /// exotic containers).
    pub fn field_with(mut self, def: FieldDef, getter: Getter, setter: Setter) -> Self {
        self.fields.push(FieldSchema { def, getter, setter });
        self
    }

    /// Binds an inherited plain field to accessors of `C`.
    pub fn bind_field<F: AsReflect + FromReflect + 'static>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&C) -> Option<&F>,
        set: fn(&mut C, F),
    ) -> Self {
        let (getter, setter) = scalar_accessors(get, set);
        self.bindings.push(Binding {
            name: name.into(),
            getter,
            setter,
        });
        self
    }

    /// Binds an inherited ordered-sequence field to accessors of `C`.
    pub fn bind_seq_field<E: AsReflect + FromReflect + 'static>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&C) -> Option<&Vec<E>>,
        set: fn(&mut C, Vec<E>),
    ) -> Self {
        let (getter, setter) = seq_accessors(get, set);
        self.bindings.push(Binding {
            name: name.into(),
            getter,
            setter,
        });
        self
    }

    /// Binds an inherited unique-element-collection field to accessors of `C`.
    pub fn bind_set_field<E: AsReflect + FromReflect + Eq + Hash + 'static>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&C) -> Option<&HashSet<E>>,
        set: fn(&mut C, HashSet<E>),
    ) -> Self {
        let (getter, setter) = set_accessors(get, set);
        self.bindings.push(Binding {
            name: name.into(),
            getter,
            setter,
        });
        self
    }

    /// Installs a factory invoked with the raw structured value instead of
    /// default construction plus field assignment. The factory has full
    /// control: returning `Ok(None)` makes the whole value decode as absent.
    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&serde_json::Value, &crate::de::Reader<'_>) -> Result<Option<Box<dyn Reflect>>, CodecError>
            + Send
            + Sync
            + 'static,
    {
        self.initializer = Some(Box::new(initializer));
        self
    }

    /// Installs a full override of the serialization walk for this class.
    ///
    /// A discriminator, when one is due, is added to the hook's output only
    /// when that output is an object; any other JSON kind passes through
    /// untagged.
    pub fn with_serializer<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Reflect, &crate::ser::Writer<'_>) -> Result<serde_json::Value, CodecError>
            + Send
            + Sync
            + 'static,
    {
        self.serialize_with = Some(Box::new(hook));
        self
    }

    /// Installs a full override of the deserialization walk for this class.
    pub fn with_deserializer<F>(mut self, hook: F) -> Self
    where
        F: Fn(&serde_json::Value, &crate::de::Reader<'_>) -> Result<Box<dyn Reflect>, CodecError>
            + Send
            + Sync
            + 'static,
    {
        self.deserialize_with = Some(Box::new(hook));
        self
    }
}

// -----------------------------------------------------------------------------
// Accessor construction

fn downcast_target<'a, C: Reflect>(
    instance: &'a mut dyn Reflect,
) -> Result<&'a mut C, CodecError> {
    let found = instance.type_name();
    instance
        .downcast_mut::<C>()
        .ok_or_else(|| CodecError::TypeMismatch {
            expected: Cow::Borrowed(std::any::type_name::<C>()),
            found: Cow::Borrowed(found),
        })
}

fn element_from_decoded<E: FromReflect + 'static>(decoded: DecodedValue) -> Result<E, CodecError> {
    match decoded {
        DecodedValue::Value(value) => {
            E::from_reflect(value).map_err(|value| CodecError::TypeMismatch {
                expected: Cow::Borrowed(std::any::type_name::<E>()),
                found: Cow::Borrowed(value.type_name()),
            })
        }
        DecodedValue::List(_) => Err(CodecError::TypeMismatch {
            expected: Cow::Borrowed(std::any::type_name::<E>()),
            found: Cow::Borrowed("a collection level"),
        }),
    }
}

fn scalar_accessors<C: Reflect, F: AsReflect + FromReflect + 'static>(
    get: fn(&C) -> Option<&F>,
    set: fn(&mut C, F),
) -> (Getter, Setter) {
    let getter: Getter = Box::new(move |instance| match instance.downcast_ref::<C>() {
        Some(target) => match get(target) {
            Some(field) => FieldValue::Value(field.as_reflect()),
            None => FieldValue::Missing,
        },
        None => FieldValue::Missing,
    });
    let setter: Setter = Box::new(move |instance, decoded| {
        let target = downcast_target::<C>(instance)?;
        set(target, element_from_decoded(decoded)?);
        Ok(())
    });
    (getter, setter)
}

fn seq_accessors<C: Reflect, E: AsReflect + FromReflect + 'static>(
    get: fn(&C) -> Option<&Vec<E>>,
    set: fn(&mut C, Vec<E>),
) -> (Getter, Setter) {
    let getter: Getter = Box::new(move |instance| match instance.downcast_ref::<C>() {
        Some(target) => match get(target) {
            Some(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| FieldValue::Value(item.as_reflect()))
                    .collect(),
            ),
            None => FieldValue::Missing,
        },
        None => FieldValue::Missing,
    });
    let setter: Setter = Box::new(move |instance, decoded| {
        let target = downcast_target::<C>(instance)?;
        match decoded {
            DecodedValue::List(items) => {
                let items = items
                    .into_iter()
                    .map(element_from_decoded)
                    .collect::<Result<Vec<E>, _>>()?;
                set(target, items);
                Ok(())
            }
            DecodedValue::Value(value) => Err(CodecError::TypeMismatch {
                expected: Cow::Borrowed("a collection level"),
                found: Cow::Borrowed(value.type_name()),
            }),
        }
    });
    (getter, setter)
}

fn seq2_accessors<C: Reflect, E: AsReflect + FromReflect + 'static>(
    get: fn(&C) -> Option<&Vec<Vec<E>>>,
    set: fn(&mut C, Vec<Vec<E>>),
) -> (Getter, Setter) {
    let getter: Getter = Box::new(move |instance| match instance.downcast_ref::<C>() {
        Some(target) => match get(target) {
            Some(levels) => FieldValue::List(
                levels
                    .iter()
                    .map(|items| {
                        FieldValue::List(
                            items
                                .iter()
                                .map(|item| FieldValue::Value(item.as_reflect()))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
            None => FieldValue::Missing,
        },
        None => FieldValue::Missing,
    });
    let setter: Setter = Box::new(move |instance, decoded| {
        let target = downcast_target::<C>(instance)?;
        match decoded {
            DecodedValue::List(levels) => {
                let levels = levels
                    .into_iter()
                    .map(|level| match level {
                        DecodedValue::List(items) => items
                            .into_iter()
                            .map(element_from_decoded)
                            .collect::<Result<Vec<E>, _>>(),
                        DecodedValue::Value(value) => Err(CodecError::TypeMismatch {
                            expected: Cow::Borrowed("a collection level"),
                            found: Cow::Borrowed(value.type_name()),
                        }),
                    })
                    .collect::<Result<Vec<Vec<E>>, _>>()?;
                set(target, levels);
                Ok(())
            }
            DecodedValue::Value(value) => Err(CodecError::TypeMismatch {
                expected: Cow::Borrowed("a collection level"),
                found: Cow::Borrowed(value.type_name()),
            }),
        }
    });
    (getter, setter)
}

fn set_accessors<C: Reflect, E: AsReflect + FromReflect + Eq + Hash + 'static>(
    get: fn(&C) -> Option<&HashSet<E>>,
    set: fn(&mut C, HashSet<E>),
) -> (Getter, Setter) {
    let getter: Getter = Box::new(move |instance| match instance.downcast_ref::<C>() {
        Some(target) => match get(target) {
            Some(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| FieldValue::Value(item.as_reflect()))
                    .collect(),
            ),
            None => FieldValue::Missing,
        },
        None => FieldValue::Missing,
    });
    let setter: Setter = Box::new(move |instance, decoded| {
        let target = downcast_target::<C>(instance)?;
        match decoded {
            DecodedValue::List(items) => {
                let items = items
                    .into_iter()
                    .map(element_from_decoded)
                    .collect::<Result<HashSet<E>, _>>()?;
                set(target, items);
                Ok(())
            }
            DecodedValue::Value(value) => Err(CodecError::TypeMismatch {
                expected: Cow::Borrowed("a collection level"),
                found: Cow::Borrowed(value.type_name()),
            }),
        }
    });
    (getter, setter)
}
