use std::ops::Not;

/// Handle to a boolean decision variable declared on a [`super::engine::SatEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(u32);

impl BoolVar {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A boolean constraint expression over declared variables.
///
/// Cardinality nodes count how many of their terms evaluate to true, so an
/// `Exactly { terms, bound: k }` node can itself be used as a 0/1 term elsewhere
/// (an if-then-else yielding one or zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Var(BoolVar),
    Const(bool),
    Not(Box<Constraint>),
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Ite {
        condition: Box<Constraint>,
        then: Box<Constraint>,
        otherwise: Box<Constraint>,
    },
    AtMost {
        terms: Vec<Constraint>,
        bound: usize,
    },
    AtLeast {
        terms: Vec<Constraint>,
        bound: usize,
    },
    Exactly {
        terms: Vec<Constraint>,
        bound: usize,
    },
}

impl Constraint {
    pub fn and(terms: Vec<Constraint>) -> Self {
        Constraint::And(terms)
    }

    pub fn or(terms: Vec<Constraint>) -> Self {
        Constraint::Or(terms)
    }

    pub fn ite(condition: Constraint, then: Constraint, otherwise: Constraint) -> Self {
        Constraint::Ite {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn at_most(terms: impl IntoIterator<Item = impl Into<Constraint>>, bound: usize) -> Self {
        Constraint::AtMost {
            terms: terms.into_iter().map(Into::into).collect(),
            bound,
        }
    }

    pub fn at_least(terms: impl IntoIterator<Item = impl Into<Constraint>>, bound: usize) -> Self {
        Constraint::AtLeast {
            terms: terms.into_iter().map(Into::into).collect(),
            bound,
        }
    }

    pub fn exactly(terms: impl IntoIterator<Item = impl Into<Constraint>>, bound: usize) -> Self {
        Constraint::Exactly {
            terms: terms.into_iter().map(Into::into).collect(),
            bound,
        }
    }

    /// Evaluates the expression under a complete assignment.
    pub fn evaluate(&self, value: &impl Fn(BoolVar) -> bool) -> bool {
        match self {
            Constraint::Var(var) => value(*var),
            Constraint::Const(b) => *b,
            Constraint::Not(inner) => !inner.evaluate(value),
            Constraint::And(terms) => terms.iter().all(|t| t.evaluate(value)),
            Constraint::Or(terms) => terms.iter().any(|t| t.evaluate(value)),
            Constraint::Ite {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(value) {
                    then.evaluate(value)
                } else {
                    otherwise.evaluate(value)
                }
            }
            Constraint::AtMost { terms, bound } => count_true(terms, value) <= *bound,
            Constraint::AtLeast { terms, bound } => count_true(terms, value) >= *bound,
            Constraint::Exactly { terms, bound } => count_true(terms, value) == *bound,
        }
    }
}

fn count_true(terms: &[Constraint], value: &impl Fn(BoolVar) -> bool) -> usize {
    terms.iter().filter(|t| t.evaluate(value)).count()
}

impl From<BoolVar> for Constraint {
    fn from(var: BoolVar) -> Self {
        Constraint::Var(var)
    }
}

impl From<bool> for Constraint {
    fn from(value: bool) -> Self {
        Constraint::Const(value)
    }
}

impl Not for Constraint {
    type Output = Constraint;

    fn not(self) -> Constraint {
        match self {
            Constraint::Not(inner) => *inner,
            Constraint::Const(b) => Constraint::Const(!b),
            other => Constraint::Not(Box::new(other)),
        }
    }
}

impl Not for BoolVar {
    type Output = Constraint;

    fn not(self) -> Constraint {
        !Constraint::Var(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(n: usize) -> Vec<BoolVar> {
        (0..n).map(BoolVar::from_index).collect()
    }

    #[test]
    fn cardinality_nodes_count_true_terms() {
        let v = vars(3);
        let assignment = |var: BoolVar| var.index() != 1;

        assert!(Constraint::exactly(v.clone(), 2).evaluate(&assignment));
        assert!(Constraint::at_most(v.clone(), 2).evaluate(&assignment));
        assert!(!Constraint::at_most(v.clone(), 1).evaluate(&assignment));
        assert!(Constraint::at_least(v, 2).evaluate(&assignment));
    }

    #[test]
    fn cardinality_nodes_can_be_nested_as_terms() {
        let v = vars(4);
        let first = Constraint::exactly(v[0..2].to_vec(), 2);
        let second = Constraint::exactly(v[2..4].to_vec(), 2);
        let objective = Constraint::at_least(vec![first, second], 2);

        assert!(objective.evaluate(&|_| true));
        assert!(!objective.evaluate(&|var: BoolVar| var.index() < 3));
    }

    #[test]
    fn ite_selects_branch_by_condition() {
        let v = vars(3);
        let expr = Constraint::ite(v[0].into(), v[1].into(), v[2].into());
        assert!(expr.evaluate(&|var: BoolVar| var.index() != 2));
        assert!(!expr.evaluate(&|var: BoolVar| var.index() == 1));
        assert!(expr.evaluate(&|var: BoolVar| var.index() == 2 || var.index() == 1));
    }

    #[test]
    fn double_negation_collapses() {
        let v = vars(1);
        assert_eq!(!!Constraint::Var(v[0]), Constraint::Var(v[0]));
        assert_eq!(!Constraint::Const(true), Constraint::Const(false));
    }
}
