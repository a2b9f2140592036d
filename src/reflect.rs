use std::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// Reflect

/// The dynamic-value seam of the codec.
///
/// Every value the engines can carry across a field boundary — class
/// instances, scalars, collection elements — is handled as a `dyn Reflect`
/// so that the recursive walk stays independent of concrete types. Schema
/// accessors downcast back to the concrete type on either side.
///
/// Implement it for your own classes with [`impl_reflect!`](crate::impl_reflect):
///
/// ```
/// use polyjson::impl_reflect;
///
/// #[derive(Default)]
/// struct Person {
///     first_name: String,
///     last_name: String,
/// }
///
/// impl_reflect!(Person);
/// ```
pub trait Reflect: Any {
    /// Returns the value as a [`&dyn Any`](Any).
    fn as_any(&self) -> &dyn Any;

    /// Returns the value as a [`&mut dyn Any`](Any).
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the boxed value as a [`Box<dyn Any>`](Any).
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Returns the full path of the underlying type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl dyn Reflect {
    /// Whether the underlying value is a `T`.
    #[inline]
    pub fn is<T: Reflect>(&self) -> bool {
        self.as_any().type_id() == TypeId::of::<T>()
    }

    /// Downcasts to a shared reference of the concrete type.
    #[inline]
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcasts to a mutable reference of the concrete type.
    #[inline]
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Returns the [`TypeId`] of the underlying value.
    #[inline]
    pub fn reflect_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Takes the concrete value out of the box, or returns the box untouched
    /// when the underlying type is not a `T`.
    pub fn take<T: Reflect>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        if self.is::<T>() {
            // Checked just above, the downcast cannot fail.
            Ok(*self.into_any().downcast::<T>().unwrap())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reflect({})", self.type_name())
    }
}

/// Implements [`Reflect`] for one or more concrete types.
#[macro_export]
macro_rules! impl_reflect {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::Reflect for $ty {
            #[inline]
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            #[inline]
            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            #[inline]
            fn type_name(&self) -> &'static str {
                ::std::any::type_name::<$ty>()
            }
        }
    )*};
}

impl_reflect!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    Vec<u8>,
    serde_json::Value,
    chrono::DateTime<chrono::Utc>,
);

// -----------------------------------------------------------------------------
// AsReflect

/// Borrows a value as a [`&dyn Reflect`](Reflect).
///
/// Concrete values reflect themselves; a `Box<dyn Reflect>` (the storage form
/// of a polymorphic field) reflects its content, so both can sit in the same
/// collection-element position.
pub trait AsReflect {
    fn as_reflect(&self) -> &dyn Reflect;
}

impl<T: Reflect> AsReflect for T {
    #[inline]
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl AsReflect for Box<dyn Reflect> {
    #[inline]
    fn as_reflect(&self) -> &dyn Reflect {
        &**self
    }
}

// -----------------------------------------------------------------------------
// FromReflect

/// Converts a boxed dynamic value back into a concrete one.
///
/// The deserializer produces integers as `i64` (or `u64` beyond the signed
/// range) and floats as `f64`; implementations for the narrower numeric types
/// adapt the width, failing on overflow. On failure the original box is
/// handed back so the caller can name the offending type.
pub trait FromReflect: Sized {
    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>>;
}

macro_rules! impl_from_reflect_direct {
    ($($ty:ty),* $(,)?) => {$(
        impl FromReflect for $ty {
            #[inline]
            fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
                value.take::<$ty>()
            }
        }
    )*};
}

impl_from_reflect_direct!(
    bool,
    String,
    Vec<u8>,
    serde_json::Value,
    chrono::DateTime<chrono::Utc>,
);

macro_rules! impl_from_reflect_int {
    ($($ty:ty),* $(,)?) => {$(
        impl FromReflect for $ty {
            fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
                let value = match value.take::<i64>() {
                    Ok(n) => return <$ty>::try_from(n).map_err(|_| Box::new(n) as Box<dyn Reflect>),
                    Err(value) => value,
                };
                let value = match value.take::<u64>() {
                    Ok(n) => return <$ty>::try_from(n).map_err(|_| Box::new(n) as Box<dyn Reflect>),
                    Err(value) => value,
                };
                value.take::<$ty>()
            }
        }
    )*};
}

impl_from_reflect_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromReflect for f64 {
    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
        match value.take::<f64>() {
            Ok(x) => Ok(x),
            Err(value) => value.take::<f32>().map(f64::from),
        }
    }
}

impl FromReflect for f32 {
    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
        match value.take::<f64>() {
            Ok(x) => Ok(x as f32),
            Err(value) => value.take::<f32>(),
        }
    }
}

impl FromReflect for Box<dyn Reflect> {
    #[inline]
    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
        Ok(value)
    }
}

// -----------------------------------------------------------------------------
// Type-name helpers

/// Strips the module path from a full type path, keeping generic arguments:
/// `my_crate::model::Person` becomes `Person`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
