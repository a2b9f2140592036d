use std::borrow::Cow;

/// Reserved key under which the discriminator is stored by default.
pub const DEFAULT_TYPE_HINT_KEY: &str = "__type";

// -----------------------------------------------------------------------------
// CodecConfig

/// Configuration shared by the serializer and the deserializer.
///
/// The default configuration emits minimal discriminators (only when the
/// runtime type differs from the declared one), checks resolved tags against
/// the declared type's subtype closure, and applies no object-count limit.
#[derive(Clone, Debug)]
pub struct CodecConfig {
    /// Structured-value key holding the discriminator.
    pub type_hint_key: Cow<'static, str>,
    /// When `false`, discriminators are neither emitted nor consulted.
    pub enable_type_hints: bool,
    /// When `true`, every encoded class value carries a discriminator, and a
    /// decoded class value without one is an error.
    pub require_type_hints: bool,
    /// When `true` (the default), a resolved tag must name the declared type
    /// or one of its transitive subtypes.
    pub strict_subtype_check: bool,
    /// Ceiling on the total leaf-value count of decoded input, checked once
    /// before any instance is constructed.
    pub max_objects: Option<usize>,
    /// Global override of every field's `emit_default` flag.
    pub emit_default_override: Option<bool>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            type_hint_key: Cow::Borrowed(DEFAULT_TYPE_HINT_KEY),
            enable_type_hints: true,
            require_type_hints: false,
            strict_subtype_check: true,
            max_objects: None,
            emit_default_override: None,
        }
    }
}

impl CodecConfig {
    /// Creates the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the discriminator key.
    pub fn type_hint_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.type_hint_key = key.into();
        self
    }

    /// Forces a discriminator on every encoded class value and requires one
    /// on every decoded class value.
    pub fn require_type_hints(mut self) -> Self {
        self.require_type_hints = true;
        self
    }

    /// Disables discriminator emission and resolution entirely.
    pub fn without_type_hints(mut self) -> Self {
        self.enable_type_hints = false;
        self
    }

    /// Disables the strict-subtype check on resolved tags.
    pub fn lenient_subtypes(mut self) -> Self {
        self.strict_subtype_check = false;
        self
    }

    /// Sets the decode-side object-count ceiling.
    pub fn max_objects(mut self, limit: usize) -> Self {
        self.max_objects = Some(limit);
        self
    }

    /// Overrides every field's `emit_default` flag.
    pub fn emit_defaults(mut self, emit: bool) -> Self {
        self.emit_default_override = Some(emit);
        self
    }
}
