//! A small DPLL decision procedure for checking exported formulas.
//!
//! This exists so the conformance suite can assert satisfiability results
//! without depending on an external SAT solver. It is a test oracle, not
//! a performance-oriented solver: unit propagation plus naive branching
//! is enough for the formula sizes the suite produces.

use quartz_proof::Cnf;

/// Removes satisfied clauses and falsified literals under one decision.
fn assign(clauses: &[Vec<i64>], literal: i64) -> Vec<Vec<i64>> {
    clauses
        .iter()
        .filter(|clause| !clause.contains(&literal))
        .map(|clause| {
            clause
                .iter()
                .copied()
                .filter(|&other| other != -literal)
                .collect()
        })
        .collect()
}

fn dpll(mut clauses: Vec<Vec<i64>>) -> bool {
    loop {
        if clauses.is_empty() {
            return true;
        }
        if clauses.iter().any(Vec::is_empty) {
            return false;
        }
        match clauses.iter().find(|clause| clause.len() == 1) {
            Some(unit) => {
                let literal = unit[0];
                clauses = assign(&clauses, literal);
            }
            None => break,
        }
    }
    let literal = clauses[0][0];
    dpll(assign(&clauses, literal)) || dpll(assign(&clauses, -literal))
}

/// Decides satisfiability of a formula.
pub fn satisfiable(cnf: &Cnf) -> bool {
    let clauses: Vec<Vec<i64>> = cnf
        .clauses()
        .map(|clause| clause.iter().map(|literal| literal.id()).collect())
        .collect();
    dpll(clauses)
}

/// Finds one model of a formula as variable-indexed booleans, if any.
pub fn model(cnf: &Cnf) -> Option<Vec<bool>> {
    let vars = cnf.var_count() as usize;
    let mut assignment = vec![None; vars];
    if !search(cnf, &mut assignment) {
        return None;
    }
    Some(
        assignment
            .into_iter()
            .map(|value| value.unwrap_or(false))
            .collect(),
    )
}

fn search(cnf: &Cnf, assignment: &mut Vec<Option<bool>>) -> bool {
    // Unit propagation over the partial assignment.
    loop {
        let mut forced = None;
        for clause in cnf.clauses() {
            let mut unassigned = None;
            let mut satisfied = false;
            let mut open = 0usize;
            for literal in clause {
                match assignment[literal.variable()] {
                    None => {
                        open += 1;
                        unassigned = Some(literal);
                    }
                    Some(value) if value == literal.is_positive() => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                }
            }
            if satisfied {
                continue;
            }
            match open {
                0 => return false,
                1 => {
                    let literal = unassigned.expect("one open literal");
                    forced = Some((literal.variable(), literal.is_positive()));
                    break;
                }
                _ => {}
            }
        }
        match forced {
            Some((variable, value)) => assignment[variable] = Some(value),
            None => break,
        }
    }

    let Some(variable) = assignment.iter().position(Option::is_none) else {
        return true;
    };
    for value in [true, false] {
        let snapshot = assignment.clone();
        assignment[variable] = Some(value);
        if search(cnf, assignment) {
            return true;
        }
        *assignment = snapshot;
    }
    false
}
