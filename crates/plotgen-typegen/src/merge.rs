//! Merging of overlapping contributions.
//!
//! The policy is asymmetric:
//!
//! - fields: the first writer of a name wins, later same-named fields are
//!   dropped;
//! - enums and flag lists: values are unioned by raw value, first-seen order
//!   kept, never duplicated. Distinct values that synthesize the same name
//!   are all kept under distinct names.
//!
//! Same-named fields that disagree on type or wire name are a conflict.
//! [`ConflictPolicy`] decides whether that is an error or a logged drop.

use crate::error::{GenerateError, Result};
use crate::ir::{EnumDef, Field, FlagListDef, StructDef};
use tracing::{debug, trace, warn};

/// What to do when two contributors declare the same field differently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail with a type-synthesis error.
    #[default]
    Strict,
    /// Keep the first declaration and log a warning.
    KeepFirst,
}

/// Applies the merge policy for one target.
#[derive(Debug, Clone)]
pub struct Merger {
    target: String,
    policy: ConflictPolicy,
}

impl Merger {
    pub fn new(target: impl Into<String>, policy: ConflictPolicy) -> Self {
        Self {
            target: target.into(),
            policy,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Append `incoming` to `into`, first writer wins by name.
    ///
    /// `owner` is the attribute path of the struct being filled, used in
    /// diagnostics.
    pub fn merge_fields(
        &self,
        owner: &str,
        into: &mut Vec<Field>,
        incoming: impl IntoIterator<Item = Field>,
    ) -> Result<()> {
        for field in incoming {
            let Some(existing) = into.iter().find(|f| f.name == field.name) else {
                into.push(field);
                continue;
            };

            if existing.ty == field.ty && existing.json_name == field.json_name {
                trace!(owner, field = %field.name, "duplicate field dropped");
                continue;
            }

            let reason = format!(
                "field `{}` is declared as {:?} (wire name `{}`) \
                 and again as {:?} (wire name `{}`)",
                field.name, existing.ty, existing.json_name, field.ty, field.json_name
            );
            match self.policy {
                ConflictPolicy::Strict => {
                    return Err(GenerateError::TypeSynthesis {
                        target: self.target.clone(),
                        path: format!("{}.{}", owner, field.json_name),
                        reason,
                    });
                }
                ConflictPolicy::KeepFirst => {
                    warn!(target_name = %self.target, owner, "{}; keeping the first", reason);
                }
            }
        }
        Ok(())
    }

    pub fn merge_struct(
        &self,
        path: &str,
        into: &mut StructDef,
        incoming: StructDef,
    ) -> Result<()> {
        if into.docs.is_none() {
            into.docs = incoming.docs;
        }
        self.merge_fields(path, &mut into.fields, incoming.fields)
    }

    /// Union `incoming`'s values into `into`, keyed by raw value.
    ///
    /// A new value whose variant name is already taken by another value is
    /// renamed: a value of another JSON kind gets the kind as prefix
    /// (`String0`), otherwise the first free ordinal suffix (`E2`).
    pub fn merge_enum(&self, path: &str, into: &mut EnumDef, incoming: EnumDef) -> Result<()> {
        if into.docs.is_none() {
            into.docs = incoming.docs;
        }
        for mut variant in incoming.variants {
            if into.variant(&variant.value).is_some() {
                continue;
            }
            let clash = into
                .variants
                .iter()
                .find(|v| v.name == variant.name)
                .map(|v| v.value.clone());
            if let Some(clash) = clash {
                let qualified = (clash.kind_name() != variant.value.kind_name())
                    .then(|| kind_qualified(variant.value.kind_name(), &variant.name));
                let name = disambiguate(&variant.name, qualified, |name| {
                    into.variants.iter().any(|v| v.name == name)
                });
                debug!(
                    target_name = %self.target,
                    path,
                    "values {} and {} of `{}` both map to `{}`, renamed the second to `{}`",
                    clash.literal(),
                    variant.value.literal(),
                    into.name,
                    variant.name,
                    name
                );
                variant.name = name;
            }
            into.variants.push(variant);
        }
        Ok(())
    }

    /// Union `incoming`'s flags into `into`, keyed by flag value.
    pub fn merge_flags(
        &self,
        path: &str,
        into: &mut FlagListDef,
        incoming: FlagListDef,
    ) -> Result<()> {
        if into.docs.is_none() {
            into.docs = incoming.docs;
        }
        for mut flag in incoming.flags {
            if into.flags.iter().any(|f| f.value == flag.value) {
                continue;
            }
            if into.flags.iter().any(|f| f.name == flag.name) {
                let name = disambiguate(&flag.name, None, |name| {
                    into.flags.iter().any(|f| f.name == name)
                });
                debug!(
                    target_name = %self.target,
                    path,
                    "flag `{}` of `{}` renamed to `{}`",
                    flag.value,
                    into.name,
                    name
                );
                flag.name = name;
            }
            into.flags.push(flag);
        }
        Ok(())
    }
}

/// `Number0` for the number `0` whose plain name `V0` is taken.
fn kind_qualified(kind: &str, name: &str) -> String {
    let bare = match name.strip_prefix('V') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => name,
    };
    format!("{}{}", kind, bare)
}

/// First free name among `preferred`, then `name2`, `name3`, ...
fn disambiguate(name: &str, preferred: Option<String>, taken: impl Fn(&str) -> bool) -> String {
    if let Some(preferred) = preferred
        && !taken(&preferred)
    {
        return preferred;
    }
    (2..)
        .map(|n| format!("{}{}", name, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
