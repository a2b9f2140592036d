//! The serializer.
//!
//! Walks a reflected value guided by its declared type and the registered
//! schemas, producing a `serde_json::Value` tree. Discriminators are emitted
//! minimally: only where the runtime type differs from the declared one (or
//! always, when the configuration requires them).

use std::any::TypeId;
use std::borrow::Cow;

use log::trace;
use serde_json::{Map, Value};

use crate::access::FieldValue;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::reflect::Reflect;
use crate::registry::SchemaRegistry;
use crate::scalar::{is_zero_scalar, write_scalar, zero_scalar};
use crate::schema::{FieldSchema, TypeRef};

// -----------------------------------------------------------------------------
// Writer

/// The serialization engine.
///
/// Custom serialize hooks receive a `&Writer` so they can recurse back into
/// the standard walk for their members.
pub struct Writer<'a> {
    registry: &'a SchemaRegistry,
    config: &'a CodecConfig,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, config: &'a CodecConfig) -> Self {
        Self { registry, config }
    }

    /// Encodes one value according to its declared type.
    pub fn write(&self, value: &dyn Reflect, declared: TypeRef) -> Result<Value, CodecError> {
        match declared {
            TypeRef::Class(id) => self.write_class(value, Some(id)),
            TypeRef::Dynamic => match value.downcast_ref::<Value>() {
                // Schema-less values pass through verbatim.
                Some(raw) => Ok(raw.clone()),
                // A typed instance in a dynamic position always carries its
                // discriminator, since no declared type will be available on
                // the way back in.
                None => self.write_class(value, None),
            },
            scalar => write_scalar(value, scalar),
        }
    }

    fn write_class(
        &self,
        value: &dyn Reflect,
        declared: Option<TypeId>,
    ) -> Result<Value, CodecError> {
        let runtime = value.reflect_type_id();
        let schema = self
            .registry
            .get(runtime)
            .ok_or(CodecError::UnregisteredClass {
                class: Cow::Borrowed(value.type_name()),
            })?;

        let hint = self.config.enable_type_hints
            && (self.config.require_type_hints || declared != Some(runtime));
        trace!(
            "encoding `{}` (hint: {})",
            schema.display_name(),
            hint
        );

        if let Some(hook) = schema.serialize_with() {
            let mut encoded = hook(value, self)?;
            if hint {
                if let Value::Object(map) = &mut encoded {
                    let key = self.config.type_hint_key.to_string();
                    map.entry(key)
                        .or_insert_with(|| Value::String(schema.display_name().to_owned()));
                }
            }
            return Ok(encoded);
        }

        let mut map = Map::new();
        if hint {
            map.insert(
                self.config.type_hint_key.to_string(),
                Value::String(schema.display_name().to_owned()),
            );
        }
        for field in schema.fields() {
            if let Some(encoded) = self.write_field(value, field)? {
                map.insert(field.json_name().to_owned(), encoded);
            }
        }
        Ok(Value::Object(map))
    }

    /// Encodes one field, or `None` when the value is suppressed.
    fn write_field(
        &self,
        instance: &dyn Reflect,
        field: &FieldSchema,
    ) -> Result<Option<Value>, CodecError> {
        let emit_default = self
            .config
            .emit_default_override
            .unwrap_or(field.emit_default());
        let dims = field.collection().dims();

        match field.view(instance) {
            FieldValue::Missing => {
                if !emit_default {
                    return Ok(None);
                }
                if dims > 0 {
                    return Ok(Some(Value::Array(Vec::new())));
                }
                Ok(zero_scalar(field.ty()))
            }
            view => {
                let encoded = self.write_view(view, field.ty(), dims)?;
                if !emit_default && suppressible(&encoded, field.ty(), dims) {
                    return Ok(None);
                }
                Ok(Some(encoded))
            }
        }
    }

    fn write_view(
        &self,
        view: FieldValue<'_>,
        ty: TypeRef,
        dims: u32,
    ) -> Result<Value, CodecError> {
        if dims == 0 {
            return match view {
                FieldValue::Value(value) => self.write(value, ty),
                FieldValue::Missing => Ok(Value::Null),
                FieldValue::List(_) => Err(CodecError::TypeMismatch {
                    expected: Cow::Borrowed(ty.expected()),
                    found: Cow::Borrowed("a collection level"),
                }),
            };
        }
        match view {
            FieldValue::List(items) => items
                .into_iter()
                .map(|item| self.write_view(item, ty, dims - 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            FieldValue::Missing => Ok(Value::Null),
            FieldValue::Value(value) => Err(CodecError::TypeMismatch {
                expected: Cow::Borrowed("a collection level"),
                found: Cow::Borrowed(value.type_name()),
            }),
        }
    }
}

/// A present value still subject to default suppression: a zero scalar, or
/// an empty top-level collection.
fn suppressible(encoded: &Value, ty: TypeRef, dims: u32) -> bool {
    if dims > 0 {
        return matches!(encoded, Value::Array(items) if items.is_empty());
    }
    is_zero_scalar(encoded, ty)
}
