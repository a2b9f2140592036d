//! The codec facade.
//!
//! Pairs a schema registry with a configuration and exposes the text-level
//! encode and decode entry points. A `Codec` is cheap to construct; build
//! one per configuration and share the registry underneath.

use std::borrow::Cow;
use std::collections::HashSet;
use std::hash::Hash;

use serde_json::Value;

use crate::config::CodecConfig;
use crate::de::Reader;
use crate::error::CodecError;
use crate::reflect::Reflect;
use crate::registry::SchemaRegistry;
use crate::schema::TypeRef;
use crate::ser::Writer;

// -----------------------------------------------------------------------------
// Codec

/// Text-level serialization facade over a [`SchemaRegistry`].
///
/// # Example
///
/// ```
/// use polyjson::{ClassBuilder, Codec, FieldDef, SchemaRegistry, TypeRef, impl_reflect};
///
/// #[derive(Default, PartialEq, Debug)]
/// struct Person {
///     first_name: String,
/// }
/// impl_reflect!(Person);
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register(ClassBuilder::<Person>::new().field(
///         FieldDef::scalar("firstName", TypeRef::String),
///         |p: &Person| Some(&p.first_name),
///         |p, v| p.first_name = v,
///     ))
///     .unwrap();
///
/// let codec = Codec::new(&registry);
/// let text = codec.encode(&Person { first_name: "Ada".into() }).unwrap();
/// let back: Person = codec.decode(&text).unwrap();
/// assert_eq!(back.first_name, "Ada");
/// ```
pub struct Codec<'r> {
    registry: &'r SchemaRegistry,
    config: CodecConfig,
}

impl<'r> Codec<'r> {
    /// A codec with the default configuration.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// A codec with an explicit configuration.
    pub fn with_config(registry: &'r SchemaRegistry, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    /// The configuration this codec runs under.
    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn writer(&self) -> Writer<'_> {
        Writer::new(self.registry, &self.config)
    }

    fn reader(&self) -> Reader<'_> {
        Reader::new(self.registry, &self.config)
    }

    // -- encode ---------------------------------------------------------------

    /// Encodes a registered class instance to text.
    pub fn encode<T: Reflect>(&self, value: &T) -> Result<String, CodecError> {
        let encoded = self.encode_value(value)?;
        Ok(serde_json::to_string(&encoded)?)
    }

    /// Encodes a registered class instance to a structured value.
    pub fn encode_value<T: Reflect>(&self, value: &T) -> Result<Value, CodecError> {
        self.writer().write(value, TypeRef::of::<T>())
    }

    /// Encodes an erased value against an explicit declared type.
    ///
    /// This is the entry point for polymorphic roots: pass the supertype as
    /// `declared` and the discriminator comes out minimal.
    pub fn encode_dyn(&self, value: &dyn Reflect, declared: TypeRef) -> Result<String, CodecError> {
        let encoded = self.writer().write(value, declared)?;
        Ok(serde_json::to_string(&encoded)?)
    }

    /// Structured-value form of [`encode_dyn`](Self::encode_dyn).
    pub fn encode_dyn_value(
        &self,
        value: &dyn Reflect,
        declared: TypeRef,
    ) -> Result<Value, CodecError> {
        self.writer().write(value, declared)
    }

    /// Encodes a homogeneously declared slice as a top-level array.
    pub fn encode_collection<T: Reflect>(&self, items: &[T]) -> Result<String, CodecError> {
        let writer = self.writer();
        let encoded = items
            .iter()
            .map(|item| writer.write(item, TypeRef::of::<T>()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::to_string(&Value::Array(encoded))?)
    }

    /// Encodes a unique-element collection as a top-level array.
    pub fn encode_set<T: Reflect + Eq + Hash>(
        &self,
        items: &HashSet<T>,
    ) -> Result<String, CodecError> {
        let writer = self.writer();
        let encoded = items
            .iter()
            .map(|item| writer.write(item, TypeRef::of::<T>()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::to_string(&Value::Array(encoded))?)
    }

    // -- decode ---------------------------------------------------------------

    /// Decodes text into a concrete class instance.
    ///
    /// The decoded runtime type must be exactly `T`; a subtype produced by a
    /// discriminator does not fit and is reported as a mismatch. Roots that
    /// are genuinely polymorphic go through [`decode_dyn`](Self::decode_dyn).
    pub fn decode<T: Reflect>(&self, text: &str) -> Result<T, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        self.decode_value(&value)
    }

    /// Structured-value form of [`decode`](Self::decode).
    pub fn decode_value<T: Reflect>(&self, value: &Value) -> Result<T, CodecError> {
        let decoded = self
            .reader()
            .read_root(value, TypeRef::of::<T>())?
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: Cow::Borrowed(std::any::type_name::<T>()),
                found: Cow::Borrowed("null"),
            })?;
        take_as::<T>(decoded)
    }

    /// Decodes text against an explicit declared type, keeping the result
    /// erased. `Ok(None)` is a `null` input.
    pub fn decode_dyn(
        &self,
        text: &str,
        declared: TypeRef,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        self.reader().read_root(&value, declared)
    }

    /// Structured-value form of [`decode_dyn`](Self::decode_dyn).
    pub fn decode_dyn_value(
        &self,
        value: &Value,
        declared: TypeRef,
    ) -> Result<Option<Box<dyn Reflect>>, CodecError> {
        self.reader().read_root(value, declared)
    }

    /// Decodes a top-level array of `T` values.
    pub fn decode_collection<T: Reflect>(&self, text: &str) -> Result<Vec<T>, CodecError> {
        self.decode_elements(text)
    }

    /// Decodes a top-level array into a unique-element collection.
    pub fn decode_set<T: Reflect + Eq + Hash>(&self, text: &str) -> Result<HashSet<T>, CodecError> {
        self.decode_elements(text)
    }

    fn decode_elements<T: Reflect, O: FromIterator<T>>(&self, text: &str) -> Result<O, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        let reader = self.reader();
        reader.preflight(&value)?;
        let items = value.as_array().ok_or_else(|| CodecError::TypeMismatch {
            expected: Cow::Borrowed("a top-level array"),
            found: Cow::Borrowed(crate::scalar::json_kind(&value)),
        })?;
        items
            .iter()
            .map(|item| {
                let decoded =
                    reader
                        .read(item, TypeRef::of::<T>())?
                        .ok_or_else(|| CodecError::TypeMismatch {
                            expected: Cow::Borrowed(std::any::type_name::<T>()),
                            found: Cow::Borrowed("null"),
                        })?;
                take_as::<T>(decoded)
            })
            .collect()
    }
}

fn take_as<T: Reflect>(decoded: Box<dyn Reflect>) -> Result<T, CodecError> {
    decoded.take::<T>().map_err(|other| CodecError::TypeMismatch {
        expected: Cow::Borrowed(std::any::type_name::<T>()),
        found: Cow::Borrowed(other.type_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::TimeZone as _;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn concrete_values_roundtrip_through_text() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let profile = fixtures::Profile {
            id: 7,
            nick: "gh".to_owned(),
            tags: vec!["navy".to_owned()],
            scores: vec![vec![1, 2], vec![3]],
            roles: ["admin".to_owned()].into_iter().collect(),
            created: Some(Utc.with_ymd_and_hms(2021, 7, 14, 9, 30, 0).unwrap()),
            avatar: Some(vec![1, 2, 255]),
        };

        let text = codec.encode(&profile).unwrap();
        let back: fixtures::Profile = codec.decode(&text).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn polymorphic_roots_roundtrip_with_minimal_tags() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);
        let declared = TypeRef::of::<fixtures::Person>();

        let employee = fixtures::employee("Grace", "Hopper", 1200.5);
        let text = codec.encode_dyn(&employee, declared).unwrap();
        assert!(text.contains("\"__type\":\"Employee\""));

        let decoded = codec.decode_dyn(&text, declared).unwrap().unwrap();
        let back = decoded.take::<fixtures::Employee>().unwrap();
        assert_eq!(back, employee);

        // The exact declared type needs no tag.
        let person = fixtures::person("Ada", "Lovelace");
        let text = codec.encode_dyn(&person, declared).unwrap();
        assert!(!text.contains("__type"));
    }

    #[test]
    fn decode_rejects_a_subtype_where_the_concrete_type_was_asked_for() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let text = codec
            .encode_dyn(
                &fixtures::employee("Grace", "Hopper", 1200.5),
                TypeRef::of::<fixtures::Person>(),
            )
            .unwrap();
        let err = codec.decode::<fixtures::Person>(&text).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn collections_roundtrip_element_by_element() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let people = vec![
            fixtures::person("Ada", "Lovelace"),
            fixtures::person("Grace", "Hopper"),
        ];
        let text = codec.encode_collection(&people).unwrap();
        let back: Vec<fixtures::Person> = codec.decode_collection(&text).unwrap();
        assert_eq!(back, people);

        let roles: HashSet<String> = ["admin".to_owned(), "ops".to_owned()].into_iter().collect();
        let text = codec.encode_set(&roles).unwrap();
        let back: HashSet<String> = codec.decode_set(&text).unwrap();
        assert_eq!(back, roles);
    }

    #[test]
    fn schema_less_values_are_idempotent_under_decode_then_encode() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let original = json!({
            "free": { "form": [1, 2.5, "three", null] },
            "__type": "NoSuchClass",
        });
        let text = serde_json::to_string(&original).unwrap();

        let decoded = codec.decode_dyn(&text, TypeRef::Dynamic).unwrap().unwrap();
        let reencoded = codec
            .encode_dyn_value(decoded.as_ref(), TypeRef::Dynamic)
            .unwrap();
        assert_eq!(reencoded, original);
    }

    #[test]
    fn nested_polymorphic_members_survive_a_roundtrip() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let team = fixtures::Team {
            lead: Some(Box::new(fixtures::employee("Grace", "Hopper", 1200.5))),
            members: vec![
                Box::new(fixtures::person("Ada", "Lovelace")),
                Box::new(fixtures::investor("Hetty", "Green", 300)),
            ],
        };

        let text = codec.encode(&team).unwrap();
        let back: fixtures::Team = codec.decode(&text).unwrap();

        let lead = back.lead.as_ref().unwrap();
        assert_eq!(
            lead.downcast_ref::<fixtures::Employee>().unwrap(),
            &fixtures::employee("Grace", "Hopper", 1200.5)
        );
        assert!(back.members[0].is::<fixtures::Person>());
        assert_eq!(
            back.members[1].downcast_ref::<fixtures::Investor>().unwrap(),
            &fixtures::investor("Hetty", "Green", 300)
        );
    }

    #[test]
    fn custom_hint_keys_apply_on_both_sides() {
        let registry = fixtures::registry();
        let codec = Codec::with_config(&registry, CodecConfig::default().type_hint_key("$kind"));
        let declared = TypeRef::of::<fixtures::Person>();

        let text = codec
            .encode_dyn(&fixtures::investor("Hetty", "Green", 300), declared)
            .unwrap();
        assert!(text.contains("\"$kind\":\"Investor\""));

        let decoded = codec.decode_dyn(&text, declared).unwrap().unwrap();
        assert!(decoded.is::<fixtures::Investor>());
    }

    #[test]
    fn disabled_hints_encode_plain_and_decode_as_declared() {
        let registry = fixtures::registry();
        let codec = Codec::with_config(&registry, CodecConfig::default().without_type_hints());
        let declared = TypeRef::of::<fixtures::Person>();

        let text = codec
            .encode_dyn(&fixtures::employee("Grace", "Hopper", 1200.5), declared)
            .unwrap();
        assert!(!text.contains("__type"));

        // Tagged input decodes as the declared type, the tag ignored.
        let tagged = json!({
            "__type": "Employee",
            "firstName": "Grace",
            "lastName": "Hopper",
        });
        let decoded = codec
            .decode_dyn_value(&tagged, declared)
            .unwrap()
            .unwrap();
        assert!(decoded.is::<fixtures::Person>());
    }

    #[test]
    fn subtype_violations_surface_at_decode_time() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);

        let tagged = json!({
            "__type": "Investor",
            "firstName": "Hetty",
            "lastName": "Green",
            "shares": 300,
        });
        let err = codec
            .decode_dyn_value(&tagged, TypeRef::of::<fixtures::Employee>())
            .unwrap_err();
        assert!(matches!(err, CodecError::SubtypeViolation { .. }));
    }

    #[test]
    fn custom_hooks_replace_the_field_walk() {
        use crate::{ClassBuilder, Reader, Writer};

        #[derive(Default, Debug, PartialEq)]
        struct Point {
            x: i64,
            y: i64,
        }
        crate::impl_reflect!(Point);

        let mut registry = SchemaRegistry::new();
        registry
            .register(
                ClassBuilder::<Point>::new()
                    .with_serializer(|value: &dyn Reflect, _: &Writer<'_>| {
                        let point = value
                            .downcast_ref::<Point>()
                            .ok_or_else(|| CodecError::custom("not a point"))?;
                        Ok(json!({ "pair": format!("{},{}", point.x, point.y) }))
                    })
                    .with_deserializer(|value: &Value, _: &Reader<'_>| {
                        let pair = value
                            .get("pair")
                            .and_then(Value::as_str)
                            .ok_or_else(|| CodecError::custom("missing pair"))?;
                        let (x, y) = pair
                            .split_once(',')
                            .ok_or_else(|| CodecError::custom("malformed pair"))?;
                        let x = x.parse().map_err(|_| CodecError::custom("malformed pair"))?;
                        let y = y.parse().map_err(|_| CodecError::custom("malformed pair"))?;
                        Ok(Box::new(Point { x, y }) as Box<dyn Reflect>)
                    }),
            )
            .unwrap();

        let codec = Codec::new(&registry);
        let text = codec.encode(&Point { x: 3, y: 4 }).unwrap();
        assert!(text.contains("\"pair\":\"3,4\""));

        let back: Point = codec.decode(&text).unwrap();
        assert_eq!(back, Point { x: 3, y: 4 });
    }

    #[test]
    fn initializers_take_over_construction() {
        use crate::{ClassBuilder, FieldDef, Reader};

        #[derive(Default, Debug, PartialEq)]
        struct Counter {
            count: i64,
        }
        crate::impl_reflect!(Counter);

        let mut registry = SchemaRegistry::new();
        registry
            .register(
                ClassBuilder::<Counter>::new()
                    .field(
                        FieldDef::scalar("count", TypeRef::Int),
                        |c: &Counter| Some(&c.count),
                        |c, v| c.count = v,
                    )
                    .with_initializer(|value: &Value, _: &Reader<'_>| {
                        let count = value
                            .get("count")
                            .and_then(Value::as_i64)
                            .ok_or_else(|| CodecError::custom("missing count"))?;
                        // Doubling proves the field walk never ran.
                        Ok(Some(Box::new(Counter { count: count * 2 }) as Box<dyn Reflect>))
                    }),
            )
            .unwrap();

        let codec = Codec::new(&registry);
        let back: Counter = codec.decode(r#"{"count":21}"#).unwrap();
        assert_eq!(back, Counter { count: 42 });
    }

    #[test]
    fn initializers_may_yield_an_absent_result() {
        use crate::{ClassBuilder, Reader};

        #[derive(Default, Debug, PartialEq)]
        struct Draft {
            body: String,
        }
        crate::impl_reflect!(Draft);

        let mut registry = SchemaRegistry::new();
        registry
            .register(ClassBuilder::<Draft>::new().with_initializer(
                |value: &Value, _: &Reader<'_>| {
                    if value.get("discard").and_then(Value::as_bool) == Some(true) {
                        return Ok(None);
                    }
                    let body = value
                        .get("body")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned();
                    Ok(Some(Box::new(Draft { body }) as Box<dyn Reflect>))
                },
            ))
            .unwrap();

        let codec = Codec::new(&registry);

        let decoded = codec
            .decode_dyn_value(&json!({ "discard": true }), TypeRef::of::<Draft>())
            .unwrap();
        assert!(decoded.is_none());

        let decoded = codec
            .decode_dyn_value(&json!({ "body": "hello" }), TypeRef::of::<Draft>())
            .unwrap()
            .unwrap();
        assert_eq!(
            decoded.take::<Draft>().unwrap(),
            Draft {
                body: "hello".to_owned()
            }
        );
    }

    #[test]
    fn null_roots_decode_to_none() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);
        let decoded = codec
            .decode_dyn("null", TypeRef::of::<fixtures::Person>())
            .unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn malformed_text_reports_the_parse_error() {
        let registry = fixtures::registry();
        let codec = Codec::new(&registry);
        let err = codec.decode::<fixtures::Person>("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }
}
