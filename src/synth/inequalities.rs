//! Linear inequality systems over the rationals.
//!
//! Solved by Fourier-Motzkin elimination with exact `BigRational`
//! arithmetic. Back-substitution prefers integer witnesses; purely
//! homogeneous systems are scaled by the denominator lcm afterwards, so for
//! them an integral solution is never missed.

use std::fmt;

use num::bigint::BigInt;
use num::integer::Integer;
use num::rational::BigRational;
use num::traits::{One, Signed, ToPrimitive, Zero};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Relation::Less => "<",
            Relation::LessEqual => "<=",
            Relation::Equal => "=",
            Relation::GreaterEqual => ">=",
            Relation::Greater => ">",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone)]
struct InputRow {
    coefficients: Vec<BigRational>,
    relation: Relation,
    rhs: BigRational,
    comment: String,
}

/// `Σ coefficients·x <= rhs`, `<` when strict.
#[derive(Debug, Clone)]
struct Lte {
    coefficients: Vec<BigRational>,
    rhs: BigRational,
    strict: bool,
}

#[derive(Debug, Clone)]
pub struct InequalitySystem {
    variables: usize,
    rows: Vec<InputRow>,
}

impl InequalitySystem {
    pub fn new(variables: usize) -> Self {
        Self {
            variables,
            rows: Vec::new(),
        }
    }

    pub fn variables(&self) -> usize {
        self.variables
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn add(
        &mut self,
        coefficients: &[i64],
        relation: Relation,
        rhs: i64,
        comment: impl Into<String>,
    ) {
        assert_eq!(
            coefficients.len(),
            self.variables,
            "row arity must match the variable count"
        );
        self.rows.push(InputRow {
            coefficients: coefficients
                .iter()
                .map(|&c| BigRational::from_integer(BigInt::from(c)))
                .collect(),
            relation,
            rhs: BigRational::from_integer(BigInt::from(rhs)),
            comment: comment.into(),
        });
    }

    fn is_homogeneous(&self) -> bool {
        self.rows.iter().all(|row| row.rhs.is_zero())
    }

    fn satisfied_by(&self, values: &[BigRational]) -> bool {
        self.rows.iter().all(|row| {
            let lhs: BigRational = row
                .coefficients
                .iter()
                .zip(values)
                .map(|(c, v)| c * v)
                .sum();
            match row.relation {
                Relation::Less => lhs < row.rhs,
                Relation::LessEqual => lhs <= row.rhs,
                Relation::Equal => lhs == row.rhs,
                Relation::GreaterEqual => lhs >= row.rhs,
                Relation::Greater => lhs > row.rhs,
            }
        })
    }

    fn normalized(&self) -> Vec<Lte> {
        let mut result = Vec::new();
        for row in &self.rows {
            let negated = || {
                (
                    row.coefficients.iter().map(|c| -c.clone()).collect(),
                    -row.rhs.clone(),
                )
            };
            match row.relation {
                Relation::Less | Relation::LessEqual => result.push(Lte {
                    coefficients: row.coefficients.clone(),
                    rhs: row.rhs.clone(),
                    strict: row.relation == Relation::Less,
                }),
                Relation::Greater | Relation::GreaterEqual => {
                    let (coefficients, rhs) = negated();
                    result.push(Lte {
                        coefficients,
                        rhs,
                        strict: row.relation == Relation::Greater,
                    });
                }
                Relation::Equal => {
                    result.push(Lte {
                        coefficients: row.coefficients.clone(),
                        rhs: row.rhs.clone(),
                        strict: false,
                    });
                    let (coefficients, rhs) = negated();
                    result.push(Lte {
                        coefficients,
                        rhs,
                        strict: false,
                    });
                }
            }
        }
        result
    }

    /// An integral solution, or `None` when the solver finds none.
    pub fn find_solution(&self) -> Option<Vec<i64>> {
        log::trace!("solving inequality system:\n{}", self);
        let n = self.variables;
        let mut current = self.normalized();
        let mut stages: Vec<Vec<Lte>> = vec![Vec::new(); n];

        for var in (0..n).rev() {
            stages[var] = current.clone();
            let mut next = Vec::new();
            let mut uppers = Vec::new();
            let mut lowers = Vec::new();
            for row in current {
                let coeff = row.coefficients[var].clone();
                if coeff.is_zero() {
                    next.push(row);
                } else if coeff.is_positive() {
                    uppers.push(row);
                } else {
                    lowers.push(row);
                }
            }
            for upper in &uppers {
                for lower in &lowers {
                    next.push(combine(upper, lower, var));
                }
            }
            current = next;
        }

        // Only constant rows are left.
        for row in &current {
            let satisfied = if row.strict {
                BigRational::zero() < row.rhs
            } else {
                BigRational::zero() <= row.rhs
            };
            if !satisfied {
                log::trace!("system is infeasible");
                return None;
            }
        }

        let mut values = vec![BigRational::zero(); n];
        for var in 0..n {
            let value = choose_value(&stages[var], var, &values);
            values[var] = value;
        }

        if values.iter().any(|value| !value.denom().is_one()) {
            if self.is_homogeneous() {
                let mut lcm = BigInt::one();
                for value in &values {
                    lcm = lcm.lcm(value.denom());
                }
                let scale = BigRational::from_integer(lcm);
                for value in &mut values {
                    *value *= scale.clone();
                }
            } else {
                // Last resort for non-homogeneous systems: snap the
                // rational witness to the nearest integer point and accept
                // it only if it still satisfies every row.
                let rounded: Vec<BigRational> = values.iter().map(BigRational::round).collect();
                if self.satisfied_by(&rounded) {
                    values = rounded;
                } else {
                    log::trace!("no integral witness found for non-homogeneous system");
                    return None;
                }
            }
        }

        values
            .into_iter()
            .map(|value| value.to_integer().to_i64())
            .collect()
    }
}

impl fmt::Display for InequalitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let terms: Vec<String> = row
                .coefficients
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(idx, c)| format!("{}*x{}", c, idx))
                .collect();
            let lhs = if terms.is_empty() {
                "0".to_owned()
            } else {
                terms.join(" + ")
            };
            writeln!(f, "{} {} {}\t[{}]", lhs, row.relation, row.rhs, row.comment)?;
        }
        Ok(())
    }
}

fn combine(upper: &Lte, lower: &Lte, var: usize) -> Lte {
    // upper: c x_var + a·x <= r with c > 0, lower: d x_var + b·x <= s with
    // d < 0. Scaling to +-1 coefficients for x_var and adding cancels it.
    let c = upper.coefficients[var].clone();
    let d = -lower.coefficients[var].clone();
    let coefficients = upper
        .coefficients
        .iter()
        .zip(&lower.coefficients)
        .map(|(a, b)| a / &c + b / &d)
        .collect();
    Lte {
        coefficients,
        rhs: &upper.rhs / &c + &lower.rhs / &d,
        strict: upper.strict || lower.strict,
    }
}

fn choose_value(rows: &[Lte], var: usize, values: &[BigRational]) -> BigRational {
    let mut lower: Option<(BigRational, bool)> = None;
    let mut upper: Option<(BigRational, bool)> = None;

    for row in rows {
        let coeff = &row.coefficients[var];
        if coeff.is_zero() {
            continue;
        }
        let mut rest = row.rhs.clone();
        for (idx, value) in values.iter().enumerate().take(var) {
            rest -= &row.coefficients[idx] * value;
        }
        let bound = rest / coeff;
        if coeff.is_positive() {
            upper = Some(match upper {
                None => (bound, row.strict),
                Some((current, strict)) => {
                    if bound < current {
                        (bound, row.strict)
                    } else if bound == current {
                        (current, strict || row.strict)
                    } else {
                        (current, strict)
                    }
                }
            });
        } else {
            // Dividing by a negative coefficient flips the relation.
            lower = Some(match lower {
                None => (bound, row.strict),
                Some((current, strict)) => {
                    if bound > current {
                        (bound, row.strict)
                    } else if bound == current {
                        (current, strict || row.strict)
                    } else {
                        (current, strict)
                    }
                }
            });
        }
    }

    let zero = BigRational::zero();
    let fits_lower = |value: &BigRational| match &lower {
        None => true,
        Some((bound, strict)) => {
            if *strict {
                value > bound
            } else {
                value >= bound
            }
        }
    };
    let fits_upper = |value: &BigRational| match &upper {
        None => true,
        Some((bound, strict)) => {
            if *strict {
                value < bound
            } else {
                value <= bound
            }
        }
    };

    if fits_lower(&zero) && fits_upper(&zero) {
        return zero;
    }

    match (&lower, &upper) {
        (Some((lb, lb_strict)), _) => {
            let candidate = least_integer_above(lb, *lb_strict);
            if fits_upper(&candidate) {
                return candidate;
            }
            match &upper {
                Some((ub, _)) => (lb + ub) / BigRational::from_integer(BigInt::from(2)),
                None => candidate,
            }
        }
        (None, Some((ub, ub_strict))) => greatest_integer_below(ub, *ub_strict),
        (None, None) => zero,
    }
}

fn least_integer_above(bound: &BigRational, strict: bool) -> BigRational {
    let mut value = bound.ceil();
    if strict && value == *bound {
        value += BigRational::one();
    }
    value
}

fn greatest_integer_below(bound: &BigRational, strict: bool) -> BigRational {
    let mut value = bound.floor();
    if strict && value == *bound {
        value -= BigRational::one();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(system: &InequalitySystem, solution: &[i64]) {
        for row in &system.rows {
            let lhs: BigRational = row
                .coefficients
                .iter()
                .zip(solution)
                .map(|(c, &x)| c * BigRational::from_integer(BigInt::from(x)))
                .sum();
            let ok = match row.relation {
                Relation::Less => lhs < row.rhs,
                Relation::LessEqual => lhs <= row.rhs,
                Relation::Equal => lhs == row.rhs,
                Relation::GreaterEqual => lhs >= row.rhs,
                Relation::Greater => lhs > row.rhs,
            };
            assert!(ok, "row '{}' violated by {:?}", row.comment, solution);
        }
    }

    #[test]
    fn empty_system_is_feasible() {
        let system = InequalitySystem::new(2);
        let solution = system.find_solution().unwrap();
        assert_eq!(solution, vec![0, 0]);
    }

    #[test]
    fn simple_bounds() {
        let mut system = InequalitySystem::new(1);
        system.add(&[1], Relation::GreaterEqual, 3, "x >= 3");
        system.add(&[1], Relation::LessEqual, 5, "x <= 5");
        let solution = system.find_solution().unwrap();
        check(&system, &solution);
    }

    #[test]
    fn contradiction_is_infeasible() {
        let mut system = InequalitySystem::new(1);
        system.add(&[1], Relation::Greater, 0, "x > 0");
        system.add(&[1], Relation::Less, 0, "x < 0");
        assert!(system.find_solution().is_none());
    }

    #[test]
    fn strict_homogeneous_system_scales_to_integers() {
        // 2x > 3y and y > 0 forces a fractional corner, scaling fixes it.
        let mut system = InequalitySystem::new(2);
        system.add(&[2, -3], Relation::Greater, 0, "2x > 3y");
        system.add(&[0, 1], Relation::Greater, 0, "y > 0");
        let solution = system.find_solution().unwrap();
        check(&system, &solution);
    }

    #[test]
    fn equality_rows_are_respected() {
        let mut system = InequalitySystem::new(2);
        system.add(&[1, -1], Relation::Equal, 0, "x = y");
        system.add(&[1, 0], Relation::GreaterEqual, 2, "x >= 2");
        let solution = system.find_solution().unwrap();
        check(&system, &solution);
        assert_eq!(solution[0], solution[1]);
    }

    #[test]
    fn mixed_system_with_integer_corner() {
        let mut system = InequalitySystem::new(3);
        system.add(&[1, 1, 0], Relation::LessEqual, 4, "x + y <= 4");
        system.add(&[1, 0, 0], Relation::GreaterEqual, 1, "x >= 1");
        system.add(&[0, 1, 0], Relation::GreaterEqual, 1, "y >= 1");
        system.add(&[0, 0, 1], Relation::Equal, 2, "z = 2");
        let solution = system.find_solution().unwrap();
        check(&system, &solution);
    }
}
