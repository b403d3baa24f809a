//! Max-of-expressions linearization
//!
//! Exact-maximum constraints only accept existing variables, so the maximum
//! of a list of expressions has to be spelled out by hand: one auxiliary
//! variable per expression, bound to it by an equality, then the maximum
//! over the auxiliaries.

use super::{ConstraintModel, LinearExpr, ModelError, VarId};

/// Variables introduced by [`linearize_max`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxLinearization {
    /// One variable per input group, equal to that group's expression
    pub aux: Vec<VarId>,
    /// Equal to the largest of `aux`
    pub max: VarId,
}

/// Introduce `aux[i] == groups[i]` for every group and `max == max(aux)`.
///
/// Each auxiliary is bounded by the range its expression can reach and the
/// maximum by the union of those ranges, so no feasible value is ever cut
/// off by a declared bound. Auxiliaries are named `{name}_{i}`, the maximum
/// is named `name`.
pub fn linearize_max(
    model: &mut ConstraintModel,
    groups: impl IntoIterator<Item = LinearExpr>,
    aux_name: &str,
    max_name: &str,
) -> Result<MaxLinearization, ModelError> {
    let mut aux = Vec::new();
    let mut lo = i64::MIN;
    let mut hi = i64::MIN;

    for (i, expr) in groups.into_iter().enumerate() {
        let var = model.new_defined_var(format!("{aux_name}_{i}"), expr)?;
        if let Some(def) = model.var(var) {
            let (var_lo, var_hi) = def.domain.bounds();
            lo = lo.max(var_lo);
            hi = hi.max(var_hi);
        }
        aux.push(var);
    }

    if aux.is_empty() {
        return Err(ModelError::EmptyMaxEquality {
            target: max_name.to_string(),
        });
    }

    let max = model.new_int_var(lo, hi, max_name);
    model.add_max_equality(max, aux.clone());

    Ok(MaxLinearization { aux, max })
}
