//! Deterministic ordering and structural fix-ups.

use crate::builder::TypeRegistry;
use crate::error::{GenerateError, Result};
use crate::ir::{Field, StructDef, TypeFile};
use crate::naming::to_camel_case;
use std::ops::RangeInclusive;

/// Replicates base axis fields across numeric suffixes.
///
/// The charting library accepts `xaxis2`, `yaxis3`, ... although the schema
/// only declares `xaxis` and `yaxis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisFixup {
    /// Wire names of the base fields.
    pub families: Vec<String>,
    pub suffixes: RangeInclusive<u32>,
}

impl Default for AxisFixup {
    fn default() -> Self {
        Self {
            families: vec!["xaxis".into(), "yaxis".into()],
            suffixes: 2..=6,
        }
    }
}

impl AxisFixup {
    /// Add the suffixed copies of every family's base field to `main`.
    ///
    /// Suffixed fields already declared are left alone.
    pub fn apply(&self, target: &str, main: &mut StructDef) -> Result<()> {
        for family in &self.families {
            let base = main
                .fields
                .iter()
                .find(|f| &f.json_name == family)
                .cloned()
                .ok_or_else(|| GenerateError::TypeSynthesis {
                    target: target.to_string(),
                    path: format!("{}.{}", main.name, family),
                    reason: "axis base field is missing".into(),
                })?;

            for suffix in self.suffixes.clone() {
                let json_name = format!("{}{}", family, suffix);
                if main.fields.iter().any(|f| f.json_name == json_name) {
                    continue;
                }
                let mut field = Field::new(to_camel_case(&json_name), json_name, base.ty.clone());
                field.docs = base.docs.clone();
                main.fields.push(field);
            }
        }
        Ok(())
    }
}

/// Build the [`TypeFile`] of one target: fix up the main type, then sort
/// every field list and every declaration list by name.
pub fn assemble(
    target: &str,
    mut main: StructDef,
    types: TypeRegistry,
    axes: Option<&AxisFixup>,
) -> Result<TypeFile> {
    if let Some(axes) = axes {
        axes.apply(target, &mut main)?;
    }
    main.sort_fields();

    // The registry iterates in name order already.
    let (mut objects, enums, flag_lists) = types.split();
    for object in &mut objects {
        object.sort_fields();
    }

    Ok(TypeFile {
        main,
        objects,
        enums,
        flag_lists,
    })
}
