//! The deserializer.
//!
//! Walks a `serde_json::Value` tree guided by the declared type, resolving
//! discriminators through the registry and constructing instances field by
//! field. The optional object-count ceiling is checked once, up front,
//! before any instance is constructed.

use std::any::TypeId;
use std::borrow::Cow;

use log::trace;
use serde_json::{Map, Value};

use crate::access::DecodedValue;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::reflect::Reflect;
use crate::registry::SchemaRegistry;
use crate::resolve::resolve_tag;
use crate::scalar::{json_kind, read_scalar};
use crate::schema::{ClassSchema, FieldSchema, TypeRef};

// -----------------------------------------------------------------------------
// Reader

/// The deserialization engine.
///
/// Custom deserialize hooks and initializers receive a `&Reader` so they can
/// recurse back into the standard walk for their members.
pub struct Reader<'a> {
    registry: &'a SchemaRegistry,
    config: &'a CodecConfig,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, config: &'a CodecConfig) -> Self {
        Self { registry, config }
    }

    /// Decodes a top-level value: preflight limit check, then the walk.
    pub(crate) fn read_root(
        &self,
        value: &Value,
        declared: TypeRef,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        self.preflight(value)?;
        self.read(value, declared)
    }

    /// Rejects input whose total leaf count exceeds the configured ceiling.
    pub(crate) fn preflight(&self, value: &Value) -> Result<(), CodecError> {
        if let Some(limit) = self.config.max_objects {
            let count = count_leaves(value);
            if count > limit {
                return Err(CodecError::ResourceLimitExceeded { count, limit });
            }
        }
        Ok(())
    }

    /// Decodes one value according to its declared type. `null` decodes to
    /// an absent value.
    pub fn read(
        &self,
        value: &Value,
        declared: TypeRef,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        match declared {
            _ if value.is_null() => Ok(None),
            TypeRef::Class(id) => self.read_class(value, id),
            TypeRef::Dynamic => self.read_dynamic(value),
            scalar => read_scalar(value, scalar).map(Some),
        }
    }

    fn read_class(
        &self,
        value: &Value,
        declared: TypeId,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        let obj = value.as_object().ok_or_else(|| CodecError::TypeMismatch {
            expected: Cow::Borrowed("an object"),
            found: Cow::Borrowed(json_kind(value)),
        })?;

        let tag = self.hint_of(obj)?;
        if tag.is_none() && self.config.enable_type_hints && self.config.require_type_hints {
            return Err(CodecError::UnknownDiscriminator { tag: None });
        }

        let resolved = match tag {
            Some(tag) => resolve_tag(self.registry, self.config, tag, declared)?,
            None => declared,
        };

        match self.registry.get(resolved) {
            Some(schema) => self.read_instance(schema, value),
            // No schema to decode against: carry the structured value
            // verbatim, discriminator included.
            None => Ok(Some(Box::new(value.clone()))),
        }
    }

    /// Builds one instance from an object value via the schema's hook,
    /// initializer, or default construction plus field assignment.
    ///
    /// An initializer has full control: its `Ok(None)` is the absent decode
    /// result, never a fallback into the field walk.
    pub(crate) fn read_instance(
        &self,
        schema: &ClassSchema,
        value: &Value,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        trace!("decoding `{}`", schema.display_name());
        if let Some(hook) = schema.deserialize_with() {
            return hook(value, self).map(Some);
        }
        if let Some(initializer) = schema.initializer() {
            return initializer(value, self);
        }

        let obj = value.as_object().ok_or_else(|| CodecError::TypeMismatch {
            expected: Cow::Borrowed("an object"),
            found: Cow::Borrowed(json_kind(value)),
        })?;

        let construct = schema.construct().ok_or_else(|| {
            CodecError::custom(format!(
                "class `{}` has no construction factory",
                schema.display_name()
            ))
        })?;
        let mut instance = construct();
        for field in schema.fields() {
            if let Some(decoded) = self.read_field(obj, field, schema.display_name())? {
                field.assign(&mut *instance, decoded)?;
            }
        }
        Ok(Some(instance))
    }

    /// Decodes one member of an object, or `None` when it is absent (or
    /// `null`) and not required.
    fn read_field(
        &self,
        obj: &Map<String, Value>,
        field: &FieldSchema,
        class: &str,
    ) -> Result<Option<DecodedValue>, CodecError> {
        match obj.get(field.json_name()) {
            None | Some(Value::Null) => {
                if field.required() {
                    return Err(CodecError::RequiredMemberMissing {
                        class: Cow::Owned(class.to_owned()),
                        field: Cow::Owned(field.json_name().to_owned()),
                    });
                }
                Ok(None)
            }
            Some(value) => self
                .read_levels(value, field.ty(), field.collection().dims())
                .map(Some),
        }
    }

    fn read_levels(
        &self,
        value: &Value,
        ty: TypeRef,
        dims: u32,
    ) -> Result<DecodedValue, CodecError> {
        if dims == 0 {
            // Collection elements are never absent; absence of a whole
            // field is handled one level up.
            return match self.read(value, ty)? {
                Some(decoded) => Ok(DecodedValue::Value(decoded)),
                None => Err(CodecError::TypeMismatch {
                    expected: Cow::Borrowed(ty.expected()),
                    found: Cow::Borrowed("an absent value"),
                }),
            };
        }
        let items = value.as_array().ok_or_else(|| CodecError::TypeMismatch {
            expected: Cow::Borrowed("a collection level"),
            found: Cow::Borrowed(json_kind(value)),
        })?;
        items
            .iter()
            .map(|item| self.read_levels(item, ty, dims - 1))
            .collect::<Result<Vec<_>, _>>()
            .map(DecodedValue::List)
    }

    /// Decodes a value with no declared type. An object whose discriminator
    /// resolves globally decodes as that class; everything else is carried
    /// verbatim.
    fn read_dynamic(&self, value: &Value) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        if let Some(obj) = value.as_object() {
            if let Some(tag) = self.hint_of(obj)? {
                let name = tag.split(':').next().unwrap_or(tag);
                if let Some(schema) = self.registry.get_by_name(name) {
                    return self.read_instance(schema, value);
                }
            }
        }
        Ok(Some(Box::new(value.clone())))
    }

    fn hint_of<'v>(&self, obj: &'v Map<String, Value>) -> Result<Option<&'v str>, CodecError> {
        if !self.config.enable_type_hints {
            return Ok(None);
        }
        match obj.get(self.config.type_hint_key.as_ref()) {
            None => Ok(None),
            Some(Value::String(tag)) => Ok(Some(tag)),
            Some(other) => Err(CodecError::TypeMismatch {
                expected: Cow::Borrowed("a string discriminator"),
                found: Cow::Borrowed(json_kind(other)),
            }),
        }
    }
}

/// Total count of leaf values (scalars and nulls) in a structured tree.
fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        Value::Object(members) => members.values().map(count_leaves).sum(),
        _ => 1,
    }
}
