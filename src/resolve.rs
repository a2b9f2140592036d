//! Discriminator resolution.
//!
//! Maps the tag carried by a structured value back to a concrete type,
//! scoped to the declared type's known-types closure.

use std::any::TypeId;
use std::borrow::Cow;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::registry::SchemaRegistry;

/// Resolves `tag` against the known-types closure of `declared`.
///
/// Tags may carry a namespace suffix (`Name:Namespace`); only the leading
/// name segment takes part in matching. Candidate names come from the
/// registered display name, falling back to the name captured when the
/// known-type entry was declared. With the strict subtype check on, the
/// resolved type must be `declared` or one of its transitive subtypes.
pub(crate) fn resolve_tag(
    registry: &SchemaRegistry,
    config: &CodecConfig,
    tag: &str,
    declared: TypeId,
) -> Result<TypeId, CodecError> {
    let name = tag.split(':').next().unwrap_or(tag);

    let mut resolved: Option<TypeId> = None;
    for (candidate, fallback) in registry.known_closure(declared) {
        let candidate_name = match registry.get(candidate) {
            Some(schema) => schema.display_name(),
            None => match fallback {
                Some(fallback) => fallback,
                None => continue,
            },
        };
        if candidate_name == name {
            resolved = Some(candidate);
            break;
        }
    }

    let resolved = resolved.ok_or_else(|| CodecError::UnknownDiscriminator {
        tag: Some(tag.to_owned()),
    })?;

    if config.strict_subtype_check && !registry.is_subtype_of(resolved, declared) {
        let declared_name = registry
            .get(declared)
            .map(|schema| schema.display_name().to_owned())
            .unwrap_or_else(|| "an unregistered class".to_owned());
        return Err(CodecError::SubtypeViolation {
            tag: tag.to_owned(),
            declared: Cow::Owned(declared_name),
        });
    }

    Ok(resolved)
}
