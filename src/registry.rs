//! The schema registry.
//!
//! A process-wide (or explicitly passed) mapping from a Rust type to its
//! registered [`ClassSchema`]. Populated once per class during a setup
//! phase; read-only from the codec engines' perspective, and therefore
//! safely shared across any number of concurrent codec calls.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use log::warn;

use crate::error::SchemaError;
use crate::reflect::{short_type_name, Reflect};
use crate::schema::builder::Binding;
use crate::schema::{ClassBuilder, ClassSchema, FieldSchema, KnownType, TypeRef};

// -----------------------------------------------------------------------------
// SchemaRegistry

/// A registry of class schemas.
///
/// This is the central store the serializer, deserializer, and type resolver
/// consult. [`register`](Self::register) consumes a finished
/// [`ClassBuilder`]; lookups run by type or by display name.
///
/// # Example
///
/// ```
/// use polyjson::{ClassBuilder, FieldDef, SchemaRegistry, TypeRef, impl_reflect};
///
/// #[derive(Default)]
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
/// assert!(registry.get_by_name("Person").is_some());
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    classes: HashMap<TypeId, ClassSchema>,
    name_to_id: HashMap<String, TypeId>,
    ambiguous_names: HashSet<String>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the class described by `builder`.
    ///
    /// Fails with a [`SchemaError`] when the class is already registered,
    /// when a field name collides with an existing (including inherited)
    /// field name, when the parent link cannot be resolved, or when an
    /// inherited field is left unbound. A known-type entry whose schema has
    /// not been registered yet is *reported* via `log::warn!` and still
    /// recorded; registration continues for the remaining entries.
    pub fn register<C: Reflect>(
        &mut self,
        builder: ClassBuilder<C>,
    ) -> Result<&ClassSchema, SchemaError> {
        let owner = TypeId::of::<C>();
        let type_name = std::any::type_name::<C>();

        let ClassBuilder {
            display_name,
            parent,
            fields: own_fields,
            mut bindings,
            known_types: own_known,
            construct,
            initializer,
            serialize_with,
            deserialize_with,
            ..
        } = builder;

        let display_name =
            display_name.unwrap_or_else(|| Cow::Borrowed(short_type_name(type_name)));

        if self.classes.contains_key(&owner) {
            return Err(SchemaError::DuplicateClass {
                class: display_name,
            });
        }

        // Snapshot inheritance: copy the parent's field metadata and known
        // types now; later registry changes never reach this schema.
        let mut fields: Vec<FieldSchema> = Vec::new();
        let mut known_types: Vec<KnownType> = Vec::new();
        if let Some((parent_id, parent_name)) = parent {
            let parent_schema =
                self.classes
                    .get(&parent_id)
                    .ok_or_else(|| SchemaError::UnknownParent {
                        class: display_name.clone(),
                        parent: Cow::Borrowed(short_type_name(parent_name)),
                    })?;
            known_types.extend_from_slice(&parent_schema.known_types);
            for inherited in &parent_schema.fields {
                let position = bindings
                    .iter()
                    .position(|binding| binding.name == inherited.def.json_name);
                let Binding { getter, setter, .. } = match position {
                    Some(position) => bindings.swap_remove(position),
                    None => {
                        return Err(SchemaError::UnboundField {
                            class: display_name,
                            field: inherited.def.json_name.clone(),
                        });
                    }
                };
                fields.push(FieldSchema {
                    def: inherited.def.clone(),
                    getter,
                    setter,
                });
            }
        }
        if let Some(stray) = bindings.into_iter().next() {
            return Err(SchemaError::UnknownBinding {
                class: display_name,
                field: stray.name,
            });
        }

        fields.extend(own_fields);

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.def.json_name.clone()) {
                return Err(SchemaError::DuplicateField {
                    class: display_name,
                    field: field.def.json_name.clone(),
                });
            }
        }

        for entry in own_known {
            if !known_types.iter().any(|known| known.id == entry.id) {
                known_types.push(entry);
            }
        }
        for entry in &known_types {
            if entry.id != owner && !self.classes.contains_key(&entry.id) {
                warn!(
                    "known type `{}` of class `{}` is not registered; keeping the entry",
                    entry.name, display_name
                );
            }
        }

        // Ordered fields first, ascending; unordered fields after, sorted
        // alphabetically among themselves.
        fields.sort_by(|a, b| {
            let key_a = (a.def.order.is_none(), a.def.order.unwrap_or(0), &a.def.json_name);
            let key_b = (b.def.order.is_none(), b.def.order.unwrap_or(0), &b.def.json_name);
            key_a.cmp(&key_b)
        });

        self.index_display_name(display_name.as_ref(), owner);
        self.classes.insert(
            owner,
            ClassSchema {
                owner,
                type_name,
                display_name,
                parent: parent.map(|(id, _)| id),
                fields,
                known_types,
                construct,
                initializer,
                serialize_with,
                deserialize_with,
            },
        );

        Ok(&self.classes[&owner])
    }

    // The display name index tolerates collisions by evicting the name:
    // ambiguous names simply stop resolving.
    fn index_display_name(&mut self, name: &str, id: TypeId) {
        if self.ambiguous_names.contains(name) {
            return;
        }
        if self.name_to_id.contains_key(name) {
            self.name_to_id.remove(name);
            self.ambiguous_names.insert(name.to_owned());
        } else {
            self.name_to_id.insert(name.to_owned(), id);
        }
    }

    /// Whether a schema is registered for the given type.
    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.classes.contains_key(&id)
    }

    /// Returns the schema registered for the given type, if any.
    #[inline]
    pub fn get(&self, id: TypeId) -> Option<&ClassSchema> {
        self.classes.get(&id)
    }

    /// Returns the schema registered for `T`, if any.
    #[inline]
    pub fn get_of<T: Reflect>(&self) -> Option<&ClassSchema> {
        self.get(TypeId::of::<T>())
    }

    /// Returns the schema with the given display name.
    ///
    /// Returns `None` when no class carries the name, or when the name is
    /// ambiguous (carried by more than one class).
    pub fn get_by_name(&self, name: &str) -> Option<&ClassSchema> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Whether the given display name matches more than one registered class.
    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }

    /// Iterates over all registered schemas in arbitrary order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ClassSchema> {
        self.classes.values()
    }

    /// The known-types closure of `root`: the root itself, its explicit
    /// known-type entries, and every class reachable through field and
    /// element declarations, transitively.
    ///
    /// Entries carry the declaration-time fallback name where one exists;
    /// resolution prefers the registered display name.
    pub(crate) fn known_closure(&self, root: TypeId) -> Vec<(TypeId, Option<&'static str>)> {
        let mut closure = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = vec![(root, None)];
        while let Some((id, fallback)) = queue.pop() {
            if !visited.insert(id) {
                continue;
            }
            closure.push((id, fallback));
            if let Some(schema) = self.classes.get(&id) {
                for known in &schema.known_types {
                    queue.push((known.id, Some(known.name)));
                }
                for field in &schema.fields {
                    if let TypeRef::Class(element) = field.def.ty {
                        queue.push((element, None));
                    }
                }
            }
        }
        closure
    }

    /// Whether `child` is `ancestor` or one of its transitive subtypes via
    /// parent links.
    pub(crate) fn is_subtype_of(&self, child: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(child);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.classes.get(&id).and_then(|schema| schema.parent);
        }
        false
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.classes.values().map(|schema| schema.display_name()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SchemaRegistryArc

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A clonable, shared [`SchemaRegistry`].
///
/// Registration (a one-time setup phase) takes the write lock; codec calls
/// only ever take the read lock, so any number of them can run concurrently.
#[derive(Clone, Default)]
pub struct SchemaRegistryArc {
    internal: Arc<RwLock<SchemaRegistry>>,
}

impl SchemaRegistryArc {
    /// Takes a read lock on the underlying [`SchemaRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, SchemaRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`SchemaRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, SchemaRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SchemaRegistryArc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.read().fmt(f)
    }
}
