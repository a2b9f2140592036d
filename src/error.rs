use std::borrow::Cow;
use std::{error, fmt};

// -----------------------------------------------------------------------------
// SchemaError

/// An enumeration of all error outcomes that might happen while registering
/// a class schema into the [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug)]
pub enum SchemaError {
    /// A class was registered twice.
    DuplicateClass { class: Cow<'static, str> },
    /// Two fields of one schema (own or inherited) share a JSON name.
    DuplicateField {
        class: Cow<'static, str>,
        field: Cow<'static, str>,
    },
    /// The declared parent class has not been registered yet.
    ///
    /// Inheritance is a snapshot taken at registration time, so the parent
    /// schema must exist before any of its children are registered.
    UnknownParent {
        class: Cow<'static, str>,
        parent: Cow<'static, str>,
    },
    /// An inherited field was left without accessors for the child type.
    UnboundField {
        class: Cow<'static, str>,
        field: Cow<'static, str>,
    },
    /// A binding names a field the parent schema does not declare.
    UnknownBinding {
        class: Cow<'static, str>,
        field: Cow<'static, str>,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateClass { class } => {
                write!(f, "class `{class}` is already registered")
            }
            Self::DuplicateField { class, field } => {
                write!(f, "duplicate field name `{field}` on class `{class}`")
            }
            Self::UnknownParent { class, parent } => {
                write!(
                    f,
                    "parent `{parent}` of class `{class}` is not registered"
                )
            }
            Self::UnboundField { class, field } => {
                write!(
                    f,
                    "inherited field `{field}` of class `{class}` has no accessor binding"
                )
            }
            Self::UnknownBinding { class, field } => {
                write!(
                    f,
                    "class `{class}` binds `{field}`, which is not an inherited field"
                )
            }
        }
    }
}

impl error::Error for SchemaError {}

// -----------------------------------------------------------------------------
// CodecError

/// An enumeration of all error outcomes that might happen while encoding or
/// decoding a value.
///
/// Every variant aborts the whole enclosing `encode`/`decode` call at the
/// point of detection; there is no partial result and no local recovery.
#[derive(Debug)]
pub enum CodecError {
    /// The structured value's shape or kind does not match the declared type.
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },
    /// A discriminator tag did not resolve within the known-types closure.
    ///
    /// `tag` is `None` when a tag was required by configuration but absent
    /// from the input.
    UnknownDiscriminator { tag: Option<String> },
    /// A tag resolved to a type outside the declared type's subtype closure
    /// while strict subtype checking was enabled.
    SubtypeViolation {
        tag: String,
        declared: Cow<'static, str>,
    },
    /// A field marked `required` was absent or null in the input.
    RequiredMemberMissing {
        class: Cow<'static, str>,
        field: Cow<'static, str>,
    },
    /// The structured input exceeded the configured object-count ceiling.
    ResourceLimitExceeded { count: usize, limit: usize },
    /// A class-typed value's runtime type has no registered schema.
    UnregisteredClass { class: Cow<'static, str> },
    /// Raised by a custom serializer, deserializer, or initializer hook.
    Custom { message: Cow<'static, str> },
    /// Schema registration failure surfaced through a codec call.
    Schema(SchemaError),
    /// Text-level JSON encoding or decoding failure.
    Json(serde_json::Error),
}

impl CodecError {
    /// Shorthand for a [`CodecError::Custom`] with the given message.
    pub fn custom(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::UnknownDiscriminator { tag: Some(tag) } => {
                write!(f, "discriminator `{tag}` does not name a known type")
            }
            Self::UnknownDiscriminator { tag: None } => {
                write!(f, "a discriminator is required but none was present")
            }
            Self::SubtypeViolation { tag, declared } => {
                write!(
                    f,
                    "discriminator `{tag}` names a type outside the subtype closure of `{declared}`"
                )
            }
            Self::RequiredMemberMissing { class, field } => {
                write!(f, "required field `{field}` of class `{class}` is missing")
            }
            Self::ResourceLimitExceeded { count, limit } => {
                write!(
                    f,
                    "input holds {count} values, exceeding the configured limit of {limit}"
                )
            }
            Self::UnregisteredClass { class } => {
                write!(f, "no schema registered for class `{class}`")
            }
            Self::Custom { message } => f.write_str(message),
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Json(err) => write!(f, "JSON text error: {err}"),
        }
    }
}

impl error::Error for CodecError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for CodecError {
    #[inline]
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<serde_json::Error> for CodecError {
    #[inline]
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
