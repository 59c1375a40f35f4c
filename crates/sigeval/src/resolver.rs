//! Turns a [`CallableShape`] plus optional caller-supplied names into ordered parameter
//! bindings and a return type.
//!
//! Input slot `i` takes `names[i]` while `i < names.len()` and the placeholder `{i}`
//! otherwise, so source text can always refer to a parameter positionally.
use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use tracing::{debug, warn};

use crate::{CallableShape, Error, NameOverflow, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub name: SmolStr,
    pub ty: ValueType,
    pub position: usize,
}

impl ParameterBinding {
    /// Placeholder name used for an unnamed input at `position`.
    pub fn placeholder(position: usize) -> SmolStr {
        format_smolstr!("{{{}}}", position)
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == Self::placeholder(self.position)
    }
}

impl Display for ParameterBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Parameter bindings in position order and the optional return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResolvedSignature {
    bindings: Vec<ParameterBinding>,
    return_type: Option<ValueType>,
}

impl ResolvedSignature {
    pub fn new(bindings: Vec<ParameterBinding>, return_type: Option<ValueType>) -> Self {
        Self {
            bindings,
            return_type,
        }
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    pub fn return_type(&self) -> Option<&ValueType> {
        self.return_type.as_ref()
    }

    pub fn arity(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }
}

impl Display for ResolvedSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.bindings.iter().join(", "))?;
        if let Some(ty) = &self.return_type {
            write!(f, " -> {}", ty)?;
        }
        Ok(())
    }
}

/// Resolves `shape` against optional caller names.
///
/// Names beyond the input count are dropped under [`NameOverflow::Ignore`] and rejected
/// under [`NameOverflow::Reject`]. Duplicate names fail with [`Error::DuplicateParameter`].
#[allow(clippy::result_large_err)]
pub fn resolve<S: AsRef<str>>(
    shape: &CallableShape,
    names: Option<&[S]>,
    overflow: NameOverflow,
) -> Result<ResolvedSignature, Error> {
    let (inputs, output) = shape.decompose()?;
    let names = names.unwrap_or_default();

    if names.len() > inputs.len() {
        match overflow {
            NameOverflow::Reject => {
                return Err(Error::BindingCountMismatch {
                    names: names.len(),
                    inputs: inputs.len(),
                });
            }
            NameOverflow::Ignore => warn!(
                "Ignoring {} parameter names beyond the {} inputs of {}",
                names.len() - inputs.len(),
                inputs.len(),
                shape
            ),
        }
    }

    let mut seen = FxHashSet::default();
    let bindings = inputs
        .iter()
        .enumerate()
        .map(|(position, ty)| {
            let name = if position < names.len() {
                SmolStr::new(names[position].as_ref())
            } else {
                ParameterBinding::placeholder(position)
            };

            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateParameter(name));
            }

            Ok(ParameterBinding {
                name,
                ty: ty.clone(),
                position,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let signature = ResolvedSignature::new(bindings, output.cloned());
    debug!("Resolved {} to {}", shape, signature);

    Ok(signature)
}
