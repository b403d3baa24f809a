use super::{Assignment, VarId};

/// Integer linear expression `sum(coef * var) + constant`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn constant_only(constant: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    pub fn term(var: VarId, coef: i64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0,
        }
    }

    pub fn from_terms(terms: impl IntoIterator<Item = (VarId, i64)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0,
        }
    }

    /// Unit-weight sum of the given variables
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self::from_terms(vars.into_iter().map(|v| (v, 1)))
    }

    pub fn add_term(&mut self, var: VarId, coef: i64) {
        self.terms.push((var, coef));
    }

    pub fn plus(mut self, constant: i64) -> Self {
        self.constant += constant;
        self
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn eval(&self, assignment: &Assignment) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * assignment.value(var))
            .sum::<i64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::term(var, 1)
    }
}

impl FromIterator<(VarId, i64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, i64)>>(iter: I) -> Self {
        Self::from_terms(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintModel;

    #[test]
    fn test_eval() {
        let mut model = ConstraintModel::new("eval");
        let x = model.new_int_var(0, 10, "x");
        let y = model.new_int_var(0, 10, "y");

        let expr: LinearExpr = [(x, 2), (y, -1)].into_iter().collect();
        let assignment = Assignment::new(vec![4, 3]);

        assert_eq!(expr.eval(&assignment), 5);
        assert_eq!(expr.plus(10).eval(&assignment), 15);
        assert_eq!(LinearExpr::sum([x, y]).eval(&assignment), 7);
        assert_eq!(LinearExpr::constant_only(-2).eval(&assignment), -2);
    }
}
