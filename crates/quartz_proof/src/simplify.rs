//! Classical SAT preprocessing: unit propagation and pure-literal
//! elimination.
//!
//! [`Cnf::simplify`] produces an equisatisfiable formula with the forced
//! and pure variables eliminated and the survivors renumbered densely. An
//! unsatisfiable input collapses to a single empty clause.

use crate::cnf::{Cnf, Literal};
use std::collections::VecDeque;

struct State {
    clauses: Vec<Vec<Literal>>,
    /// Clause indices containing each variable positively / negatively.
    pos_uses: Vec<Vec<usize>>,
    neg_uses: Vec<Vec<usize>>,
    active: Vec<bool>,
    /// Unassigned-literal count per clause.
    size: Vec<usize>,
    assigned: Vec<Option<bool>>,
    unit_queue: VecDeque<usize>,
    is_unsat: bool,
}

impl State {
    fn new(cnf: &Cnf) -> Self {
        let var_count = cnf.var_count() as usize;
        let clauses: Vec<Vec<Literal>> = cnf.clauses().map(|clause| clause.to_vec()).collect();
        let mut pos_uses = vec![Vec::new(); var_count];
        let mut neg_uses = vec![Vec::new(); var_count];
        for (index, clause) in clauses.iter().enumerate() {
            for literal in clause {
                if literal.is_positive() {
                    pos_uses[literal.variable()].push(index);
                } else {
                    neg_uses[literal.variable()].push(index);
                }
            }
        }
        let size: Vec<usize> = clauses.iter().map(Vec::len).collect();
        let unit_queue: VecDeque<usize> = clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| clause.len() == 1)
            .map(|(index, _)| index)
            .collect();
        let is_unsat = clauses.iter().any(Vec::is_empty);
        let active = vec![true; clauses.len()];
        let assigned = vec![None; var_count];
        Self {
            clauses,
            pos_uses,
            neg_uses,
            active,
            size,
            assigned,
            unit_queue,
            is_unsat,
        }
    }

    /// Fixes a variable: satisfied clauses deactivate, opposite-polarity
    /// clauses shrink, shrinking to one literal feeds the unit queue.
    fn assign(&mut self, variable: usize, value: bool) {
        self.assigned[variable] = Some(value);
        let (satisfied, shrunk) = if value {
            (&self.pos_uses[variable], &self.neg_uses[variable])
        } else {
            (&self.neg_uses[variable], &self.pos_uses[variable])
        };
        for &index in satisfied {
            self.active[index] = false;
        }
        let shrunk = shrunk.clone();
        for index in shrunk {
            if !self.active[index] {
                continue;
            }
            self.size[index] -= 1;
            match self.size[index] {
                0 => self.is_unsat = true,
                1 => self.unit_queue.push_back(index),
                _ => {}
            }
        }
    }

    fn propagate(&mut self) {
        while let Some(index) = self.unit_queue.pop_front() {
            if self.is_unsat {
                return;
            }
            if !self.active[index] {
                continue;
            }
            let mut unit = None;
            let mut satisfied = false;
            for &literal in &self.clauses[index] {
                match self.assigned[literal.variable()] {
                    None => unit = Some(literal),
                    Some(value) if value == literal.is_positive() => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                }
            }
            if satisfied {
                self.active[index] = false;
                continue;
            }
            match unit {
                Some(literal) => self.assign(literal.variable(), literal.is_positive()),
                None => {
                    self.is_unsat = true;
                    return;
                }
            }
        }
    }

    /// Assigns every variable that occurs in only one polarity among the
    /// active clauses, then propagates; repeats until a fixed point.
    fn eliminate_pure_literals(&mut self) {
        loop {
            self.propagate();
            if self.is_unsat {
                return;
            }
            let mut assigned_any = false;
            for variable in 0..self.assigned.len() {
                if self.assigned[variable].is_some() {
                    continue;
                }
                let occurs_pos = self.pos_uses[variable]
                    .iter()
                    .any(|&index| self.active[index]);
                let occurs_neg = self.neg_uses[variable]
                    .iter()
                    .any(|&index| self.active[index]);
                match (occurs_pos, occurs_neg) {
                    (true, false) => {
                        self.assign(variable, true);
                        assigned_any = true;
                    }
                    (false, true) => {
                        self.assign(variable, false);
                        assigned_any = true;
                    }
                    _ => {}
                }
            }
            if !assigned_any {
                return;
            }
        }
    }

    /// Emits the surviving clauses with densely renumbered variables.
    fn emit(&self) -> Cnf {
        let mut result = Cnf::new();
        if self.is_unsat {
            result.add_clause(&[]);
            return result;
        }
        let mut remap: Vec<Option<Literal>> = vec![None; self.assigned.len()];
        let mut survivors: Vec<Vec<Literal>> = Vec::new();
        for (index, clause) in self.clauses.iter().enumerate() {
            if !self.active[index] {
                continue;
            }
            survivors.push(
                clause
                    .iter()
                    .copied()
                    .filter(|literal| self.assigned[literal.variable()].is_none())
                    .collect(),
            );
        }
        // Dense renumbering in ascending old-variable order.
        for clause in &survivors {
            for literal in clause {
                remap[literal.variable()] = Some(Literal::new(1));
            }
        }
        for slot in remap.iter_mut() {
            if slot.is_some() {
                *slot = Some(result.var());
            }
        }
        for clause in &survivors {
            let renumbered: Vec<Literal> = clause
                .iter()
                .map(|literal| {
                    let fresh = remap[literal.variable()].expect("remap covers survivors");
                    if literal.is_positive() {
                        fresh
                    } else {
                        !fresh
                    }
                })
                .collect();
            result.add_clause(&renumbered);
        }
        result
    }
}

impl Cnf {
    /// Unit propagation and pure-literal elimination.
    ///
    /// The result is equisatisfiable with `self`: eliminated variables are
    /// either forced (units) or safely assignable (pure), so any model of
    /// the result extends to one of the original. An unsatisfiable input
    /// yields a formula with one empty clause.
    pub fn simplify(&self) -> Cnf {
        let mut state = State::new(self);
        state.eliminate_pure_literals();
        state.emit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(id: i64) -> Literal {
        Literal::new(id)
    }

    /// Brute-force satisfiability over every assignment.
    fn satisfiable(cnf: &Cnf) -> bool {
        let vars = cnf.var_count() as usize;
        assert!(vars <= 20);
        (0..(1u64 << vars)).any(|pattern| {
            let assignment: Vec<bool> = (0..vars).map(|bit| pattern & (1 << bit) != 0).collect();
            cnf.evaluate(&assignment)
        })
    }

    #[test]
    fn unit_chain_collapses_completely() {
        // (a) (¬a ∨ b) (¬b ∨ c): all three variables are forced.
        let mut cnf = Cnf::new();
        let a = cnf.var();
        let b = cnf.var();
        let c = cnf.var();
        cnf.add_clause(&[a]);
        cnf.add_clause(&[!a, b]);
        cnf.add_clause(&[!b, c]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.len(), 0);
        assert_eq!(simplified.var_count(), 0);
    }

    #[test]
    fn conflicting_units_are_unsat() {
        let mut cnf = Cnf::new();
        let a = cnf.var();
        cnf.add_clause(&[a]);
        cnf.add_clause(&[!a]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.len(), 1);
        assert_eq!(simplified.clauses().next().unwrap().len(), 0);
        assert!(!satisfiable(&simplified));
    }

    #[test]
    fn empty_clause_stays_unsat() {
        let mut cnf = Cnf::new();
        cnf.var();
        cnf.add_clause(&[]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.len(), 1);
        assert!(!satisfiable(&simplified));
    }

    #[test]
    fn pure_literals_satisfy_their_clauses() {
        // b occurs only positively, a only negatively: everything
        // disappears.
        let mut cnf = Cnf::new();
        let a = cnf.var();
        let b = cnf.var();
        let c = cnf.var();
        cnf.add_clause(&[!a, b]);
        cnf.add_clause(&[!a, b, c]);
        cnf.add_clause(&[b, !c]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.len(), 0);
    }

    #[test]
    fn mixed_polarity_variables_survive() {
        // (a ∨ b) (¬a ∨ b) (¬b ∨ a) (¬a ∨ ¬b): no units, no pure
        // literals, so the formula survives unchanged.
        let mut cnf = Cnf::new();
        let a = cnf.var();
        let b = cnf.var();
        cnf.add_clause(&[a, b]);
        cnf.add_clause(&[!a, b]);
        cnf.add_clause(&[!b, a]);
        cnf.add_clause(&[!a, !b]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.len(), 4);
        assert_eq!(simplified.var_count(), 2);
        assert_eq!(satisfiable(&cnf), satisfiable(&simplified));
    }

    #[test]
    fn renumbering_is_dense() {
        // Variable 2 is forced; 1 and 3 survive and renumber to 1 and 2.
        let mut cnf = Cnf::new();
        let a = cnf.var();
        let b = cnf.var();
        let c = cnf.var();
        cnf.add_clause(&[b]);
        cnf.add_clause(&[a, c]);
        cnf.add_clause(&[!a, !c]);
        let simplified = cnf.simplify();
        assert_eq!(simplified.var_count(), 2);
        let ids: Vec<Vec<i64>> = simplified
            .clauses()
            .map(|clause| clause.iter().map(|l| l.id()).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2], vec![-1, -2]]);
    }

    #[test]
    fn simplify_preserves_satisfiability_on_random_formulas() {
        // Deterministic pseudo-random 3-SAT-ish formulas.
        let mut seed = 0x2545f491u64;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };
        for _ in 0..40 {
            let vars = 6;
            let mut cnf = Cnf::new();
            for _ in 0..vars {
                cnf.var();
            }
            let clause_count = 3 + (next() % 10) as usize;
            for _ in 0..clause_count {
                let len = 1 + (next() % 3) as usize;
                let clause: Vec<Literal> = (0..len)
                    .map(|_| {
                        let var = (next() % vars as u64) as i64 + 1;
                        if next() % 2 == 0 {
                            literal(var)
                        } else {
                            literal(-var)
                        }
                    })
                    .collect();
                cnf.add_clause(&clause);
            }
            let simplified = cnf.simplify();
            assert_eq!(
                satisfiable(&cnf),
                satisfiable(&simplified),
                "simplify changed satisfiability"
            );
        }
    }
}
