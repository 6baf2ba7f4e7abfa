//! Translation of [`Constraint`] expressions into clauses.
//!
//! Literals use the DIMACS convention: variable `v` is `v` (positive) or `-v` (negated),
//! numbering starts at one. Compound sub-expressions get a defining variable (Tseitin) and
//! cardinality nodes are encoded with totalizers whose unary outputs are shared between
//! every expression counting over the same inputs.

use super::constraint::{BoolVar, Constraint};
use super::engine::SolverError;
use std::collections::HashMap;

pub(crate) type Lit = i32;
pub(crate) type Clause = Vec<Lit>;

#[derive(Debug, Default)]
pub(crate) struct CnfEncoder {
    num_vars: i32,
    declared: Vec<Lit>,
    true_lit: Option<Lit>,
    clauses: Vec<Clause>,
    definitions: HashMap<Constraint, Lit>,
    /// Sorted input literals -> outputs, where `outputs[i]` holds iff more than `i` inputs hold.
    counters: HashMap<Vec<Lit>, Vec<Lit>>,
}

impl CnfEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self) -> BoolVar {
        let lit = self.fresh();
        self.declared.push(lit);
        BoolVar::from_index(self.declared.len() - 1)
    }

    pub fn var_literal(&self, var: BoolVar) -> Result<Lit, SolverError> {
        self.declared
            .get(var.index())
            .copied()
            .ok_or(SolverError::UnknownVariable(var))
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars as usize
    }

    /// Hands over the clauses produced since the previous call.
    pub fn take_clauses(&mut self) -> Vec<Clause> {
        std::mem::take(&mut self.clauses)
    }

    /// Encodes `constraint` as a hard requirement.
    pub fn assert(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        match constraint {
            Constraint::Const(true) => {}
            Constraint::Const(false) => {
                let t = self.truth();
                self.emit(vec![-t]);
            }
            Constraint::And(terms) => {
                for term in terms {
                    self.assert(term)?;
                }
            }
            Constraint::Or(terms) => {
                let clause = self.literals(terms)?;
                if clause.is_empty() {
                    let t = self.truth();
                    self.emit(vec![-t]);
                } else {
                    self.emit(clause);
                }
            }
            Constraint::AtMost { terms, bound } => {
                let inputs = self.literals(terms)?;
                self.assert_at_most(&inputs, *bound);
            }
            Constraint::AtLeast { terms, bound } => {
                let inputs = self.literals(terms)?;
                let lit = self.at_least_lit(&inputs, *bound);
                self.emit(vec![lit]);
            }
            Constraint::Exactly { terms, bound } => {
                let inputs = self.literals(terms)?;
                let upper = self.at_most_lit(&inputs, *bound);
                let lower = self.at_least_lit(&inputs, *bound);
                self.emit(vec![upper]);
                self.emit(vec![lower]);
            }
            other => {
                let lit = self.literal(other)?;
                self.emit(vec![lit]);
            }
        }
        Ok(())
    }

    fn fresh(&mut self) -> Lit {
        self.num_vars += 1;
        self.num_vars
    }

    fn truth(&mut self) -> Lit {
        if let Some(t) = self.true_lit {
            return t;
        }
        let t = self.fresh();
        self.emit(vec![t]);
        self.true_lit = Some(t);
        t
    }

    fn emit(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    fn literals(&mut self, terms: &[Constraint]) -> Result<Vec<Lit>, SolverError> {
        terms.iter().map(|term| self.literal(term)).collect()
    }

    /// Returns a literal equivalent to `constraint`.
    fn literal(&mut self, constraint: &Constraint) -> Result<Lit, SolverError> {
        if let Some(&lit) = self.definitions.get(constraint) {
            return Ok(lit);
        }
        let lit = match constraint {
            Constraint::Var(var) => return self.var_literal(*var),
            Constraint::Const(value) => {
                let t = self.truth();
                return Ok(if *value { t } else { -t });
            }
            Constraint::Not(inner) => return Ok(-self.literal(inner)?),
            Constraint::And(terms) => {
                let lits = self.literals(terms)?;
                self.and_lit(&lits)
            }
            Constraint::Or(terms) => {
                let lits = self.literals(terms)?;
                self.or_lit(&lits)
            }
            Constraint::Ite {
                condition,
                then,
                otherwise,
            } => {
                let c = self.literal(condition)?;
                let a = self.literal(then)?;
                let b = self.literal(otherwise)?;
                let x = self.fresh();
                self.emit(vec![-c, -a, x]);
                self.emit(vec![-c, a, -x]);
                self.emit(vec![c, -b, x]);
                self.emit(vec![c, b, -x]);
                x
            }
            Constraint::AtMost { terms, bound } => {
                let inputs = self.literals(terms)?;
                self.at_most_lit(&inputs, *bound)
            }
            Constraint::AtLeast { terms, bound } => {
                let inputs = self.literals(terms)?;
                self.at_least_lit(&inputs, *bound)
            }
            Constraint::Exactly { terms, bound } => {
                let inputs = self.literals(terms)?;
                self.exactly_lit(&inputs, *bound)
            }
        };
        self.definitions.insert(constraint.clone(), lit);
        Ok(lit)
    }

    fn and_lit(&mut self, lits: &[Lit]) -> Lit {
        match lits {
            [] => self.truth(),
            [single] => *single,
            _ => {
                let x = self.fresh();
                let mut back = Vec::with_capacity(lits.len() + 1);
                back.push(x);
                for &l in lits {
                    self.emit(vec![-x, l]);
                    back.push(-l);
                }
                self.emit(back);
                x
            }
        }
    }

    fn or_lit(&mut self, lits: &[Lit]) -> Lit {
        match lits {
            [] => -self.truth(),
            [single] => *single,
            _ => {
                let x = self.fresh();
                let mut forward = Vec::with_capacity(lits.len() + 1);
                forward.push(-x);
                for &l in lits {
                    self.emit(vec![x, -l]);
                    forward.push(l);
                }
                self.emit(forward);
                x
            }
        }
    }

    fn at_least_lit(&mut self, inputs: &[Lit], bound: usize) -> Lit {
        if bound == 0 {
            return self.truth();
        }
        if bound > inputs.len() {
            return -self.truth();
        }
        let outputs = self.counter(inputs, bound);
        outputs[bound - 1]
    }

    fn at_most_lit(&mut self, inputs: &[Lit], bound: usize) -> Lit {
        if bound >= inputs.len() {
            return self.truth();
        }
        let outputs = self.counter(inputs, bound + 1);
        -outputs[bound]
    }

    fn exactly_lit(&mut self, inputs: &[Lit], bound: usize) -> Lit {
        if bound > inputs.len() {
            return -self.truth();
        }
        let upper = self.at_most_lit(inputs, bound);
        let lower = self.at_least_lit(inputs, bound);
        self.and_lit(&[lower, upper])
    }

    /// Top-level "at most" only needs the upward half of the totalizer.
    fn assert_at_most(&mut self, inputs: &[Lit], bound: usize) {
        if bound >= inputs.len() {
            return;
        }
        if bound == 0 {
            for &l in inputs {
                self.emit(vec![-l]);
            }
            return;
        }
        let mut key = inputs.to_vec();
        key.sort_unstable();
        if let Some(outputs) = self.counters.get(&key) {
            if outputs.len() > bound {
                let out = outputs[bound];
                self.emit(vec![-out]);
                return;
            }
        }
        let outputs = self.totalizer(inputs, bound + 1, false);
        self.emit(vec![-outputs[bound]]);
    }

    /// Shared, fully reified unary counter with at least `need` outputs.
    fn counter(&mut self, inputs: &[Lit], need: usize) -> Vec<Lit> {
        let need = need.min(inputs.len());
        let mut key = inputs.to_vec();
        key.sort_unstable();

        let previous = match self.counters.get(&key) {
            Some(outputs) if outputs.len() >= need => return outputs.clone(),
            Some(outputs) => outputs.len(),
            None => 0,
        };
        // Grow geometrically so repeated ratchets rebuild only logarithmically often.
        let cap = need.max(previous * 2).min(inputs.len());
        let outputs = self.totalizer(inputs, cap, true);
        self.counters.insert(key, outputs.clone());
        outputs
    }

    /// Builds a totalizer truncated at `cap` outputs.
    ///
    /// Upward clauses force `outputs[s - 1]` once `s` inputs hold; with `bidirectional` the
    /// downward clauses additionally force `outputs[s - 1]` false while fewer than `s` hold.
    fn totalizer(&mut self, inputs: &[Lit], cap: usize, bidirectional: bool) -> Vec<Lit> {
        if inputs.len() == 1 {
            return vec![inputs[0]];
        }
        let mid = inputs.len() / 2;
        let left = self.totalizer(&inputs[..mid], cap, bidirectional);
        let right = self.totalizer(&inputs[mid..], cap, bidirectional);
        let width = (left.len() + right.len()).min(cap);
        let outputs: Vec<Lit> = (0..width).map(|_| self.fresh()).collect();

        for i in 0..=left.len() {
            for j in 0..=right.len() {
                let sum = i + j;
                if sum >= 1 && sum <= width {
                    let mut clause = Vec::with_capacity(3);
                    if i > 0 {
                        clause.push(-left[i - 1]);
                    }
                    if j > 0 {
                        clause.push(-right[j - 1]);
                    }
                    clause.push(outputs[sum - 1]);
                    self.emit(clause);
                }
                if bidirectional && sum < width {
                    let mut clause = Vec::with_capacity(3);
                    if i < left.len() {
                        clause.push(left[i]);
                    }
                    if j < right.len() {
                        clause.push(right[j]);
                    }
                    clause.push(-outputs[sum]);
                    self.emit(clause);
                }
            }
        }
        outputs
    }
}
