//! 齐次整数方程组: 精确求零空间的整数基.
//!
//! Row reduction runs over `BigRational`, the resulting rational vectors are
//! scaled by the denominator lcm and reduced by the gcd, so no precision is
//! lost on the way to an integer basis.

use num::bigint::BigInt;
use num::integer::Integer;
use num::rational::BigRational;
use num::traits::{One, Signed, ToPrimitive, Zero};

/// A system of homogeneous equations `coefficients · x = 0`.
#[derive(Debug, Clone)]
pub struct EquationSystem {
    variables: usize,
    equations: Vec<Vec<BigInt>>,
}

impl EquationSystem {
    pub fn new(variables: usize) -> Self {
        Self {
            variables,
            equations: Vec::new(),
        }
    }

    pub fn variables(&self) -> usize {
        self.variables
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn add_equation(&mut self, coefficients: &[i64]) {
        assert_eq!(
            coefficients.len(),
            self.variables,
            "equation arity must match the variable count"
        );
        self.equations
            .push(coefficients.iter().map(|&c| BigInt::from(c)).collect());
    }

    /// An integer basis of the solution space. Basis size is
    /// `variables - rank`.
    pub fn find_basis(&self) -> Vec<Vec<i64>> {
        compute_nullspace(&self.equations, self.variables)
            .into_iter()
            .map(|vector| {
                vector
                    .into_iter()
                    .map(|value| {
                        value
                            .to_i64()
                            .expect("normalized basis entries fit in i64")
                    })
                    .collect()
            })
            .collect()
    }
}

fn compute_nullspace(matrix: &[Vec<BigInt>], cols: usize) -> Vec<Vec<BigInt>> {
    if cols == 0 {
        return Vec::new();
    }

    let rows = matrix.len();
    if rows == 0 {
        return (0..cols)
            .map(|free_col| {
                let mut vector = vec![BigInt::from(0); cols];
                vector[free_col] = BigInt::from(1);
                vector
            })
            .collect();
    }

    let mut rref = matrix
        .iter()
        .map(|row| {
            (0..cols)
                .map(|idx| row.get(idx).cloned().unwrap_or_else(BigInt::zero).into())
                .collect::<Vec<BigRational>>()
        })
        .collect::<Vec<_>>();

    let mut pivot_cols = Vec::new();
    let mut pivot_row = 0usize;

    for col in 0..cols {
        if pivot_row >= rows {
            break;
        }
        let mut pivot = None;
        for row in pivot_row..rows {
            if !rref[row][col].is_zero() {
                pivot = Some(row);
                break;
            }
        }
        let Some(row_idx) = pivot else {
            continue;
        };

        if row_idx != pivot_row {
            rref.swap(row_idx, pivot_row);
        }

        let pivot_value = rref[pivot_row][col].clone();
        for value in rref[pivot_row].iter_mut() {
            *value /= pivot_value.clone();
        }

        for row in 0..rows {
            if row == pivot_row {
                continue;
            }
            let factor = rref[row][col].clone();
            if factor.is_zero() {
                continue;
            }
            for inner_col in col..cols {
                let adjustment = rref[pivot_row][inner_col].clone() * factor.clone();
                rref[row][inner_col] -= adjustment;
            }
        }

        pivot_cols.push(col);
        pivot_row += 1;
    }

    let mut pivot_flags = vec![false; cols];
    for &col in &pivot_cols {
        pivot_flags[col] = true;
    }

    let free_cols = (0..cols)
        .filter(|&col| !pivot_flags[col])
        .collect::<Vec<_>>();

    if free_cols.is_empty() {
        return Vec::new();
    }

    let mut basis = Vec::new();
    for &free_col in &free_cols {
        let mut vector = vec![BigRational::from_integer(BigInt::zero()); cols];
        vector[free_col] = BigRational::one();
        for (pivot_index, &pivot_col) in pivot_cols.iter().enumerate() {
            let coeff = rref[pivot_index][free_col].clone();
            if !coeff.is_zero() {
                vector[pivot_col] = -coeff;
            }
        }
        basis.push(rational_vector_to_integer(vector));
    }

    basis
        .into_iter()
        .map(normalize_integer_vector)
        .collect::<Vec<_>>()
}

fn rational_vector_to_integer(vector: Vec<BigRational>) -> Vec<BigInt> {
    let mut lcm = BigInt::one();
    for value in &vector {
        let denom = value.denom();
        if denom.is_zero() {
            continue;
        }
        lcm = lcm.lcm(denom);
    }

    vector
        .into_iter()
        .map(|value| {
            let numer = value.numer().clone();
            let denom = value.denom().clone();
            if denom.is_zero() {
                BigInt::zero()
            } else {
                let scale = &lcm / denom;
                numer * scale
            }
        })
        .collect()
}

fn normalize_integer_vector(mut vector: Vec<BigInt>) -> Vec<BigInt> {
    let mut gcd = BigInt::zero();
    for value in &vector {
        if value.is_zero() {
            continue;
        }
        let abs = value.abs();
        gcd = if gcd.is_zero() { abs } else { gcd.gcd(&abs) };
    }

    if !gcd.is_zero() && gcd != BigInt::one() {
        for value in &mut vector {
            *value /= gcd.clone();
        }
    }

    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solves(system: &EquationSystem, vector: &[i64]) -> bool {
        (0..system.len()).all(|row| {
            system.equations[row]
                .iter()
                .zip(vector)
                .map(|(c, &x)| c * BigInt::from(x))
                .sum::<BigInt>()
                .is_zero()
        })
    }

    #[test]
    fn no_equations_gives_unit_basis() {
        let system = EquationSystem::new(3);
        let basis = system.find_basis();
        assert_eq!(
            basis,
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]
        );
    }

    #[test]
    fn zero_variables_gives_empty_basis() {
        let system = EquationSystem::new(0);
        assert!(system.find_basis().is_empty());
    }

    #[test]
    fn single_equation_drops_one_dimension() {
        let mut system = EquationSystem::new(3);
        system.add_equation(&[1, -1, 0]);
        let basis = system.find_basis();
        assert_eq!(basis.len(), 2);
        for vector in &basis {
            assert!(solves(&system, vector));
        }
    }

    #[test]
    fn full_rank_system_has_empty_basis() {
        let mut system = EquationSystem::new(2);
        system.add_equation(&[1, 0]);
        system.add_equation(&[1, 1]);
        assert!(system.find_basis().is_empty());
    }

    #[test]
    fn rational_pivots_still_give_integer_basis() {
        let mut system = EquationSystem::new(3);
        system.add_equation(&[2, 3, 0]);
        let basis = system.find_basis();
        assert_eq!(basis.len(), 2);
        for vector in &basis {
            assert!(solves(&system, vector));
            let gcd = vector
                .iter()
                .fold(0i64, |acc, &v| num::integer::gcd(acc, v.abs()));
            assert_eq!(gcd, 1);
        }
        // The vector orthogonal to (2, 3, 0) in the first two coordinates.
        assert!(basis.iter().any(|v| v == &vec![-3, 2, 0] || v == &vec![3, -2, 0]));
    }

    #[test]
    fn basis_is_stable_across_calls() {
        let mut system = EquationSystem::new(4);
        system.add_equation(&[1, 1, -1, 0]);
        system.add_equation(&[0, 1, 0, -1]);
        assert_eq!(system.find_basis(), system.find_basis());
    }
}
