// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The Schur-complement Hessian backend, for the bordered block form
//!
//! ```text
//!        [ A  B ]
//!   H  = [      ]      A in R^(LxL),  D in R^(RxR),  L + R = N
//!        [ B' D ]
//! ```
//!
//! that arises in bundle-adjustment-like problems: `A` is large and sparse
//! (one diagonal block per "point"-like variable, in the motivating
//! application), `D` is comparatively small (one block per "camera"-like
//! variable) and is kept dense once the Schur complement has absorbed `A`.
//!
//! `A` and `B` are backed by `faer`'s sparse CSC type; `D` and the Schur
//! complement `D' = D - B' A^-1 B` are kept as dense `nalgebra` matrices,
//! since `R` is small in the problems this shape targets.
//!
//! Per the known caveat in the design notes, the symbolic factorization of
//! `A` is never persisted across `initialize_solver` calls — locking it
//! interacts badly with a sparse-multiply routine elsewhere in the
//! ecosystem that elides stored zeros, silently changing the effective
//! pattern. `initialize_solver` performs a throwaway trial factorization
//! purely to detect a non-SPD `A` early; `solve` refactorizes `A` from
//! scratch every time it is called.

use crate::error::{Error, TrustRegionError};
use crate::hessian::{FormFromJacobian, HessianOps};
use faer::sparse::SparseColMat;
use faer::Side;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

/// The Jacobian shape this backend consumes: two sparse blocks `J_L`
/// (`M x L`) and `J_R` (`M x R`), sharing the same `M` rows (residuals).
pub type BlockJacobian = (SparseColMat<usize, f64>, SparseColMat<usize, f64>);

/// A Schur-complement Hessian over the block partition `[A B; B^T D]`.
pub struct SchurHessian {
    l: usize,
    r: usize,
    a: SparseColMat<usize, f64>,
    b: SparseColMat<usize, f64>,
    d: DMatrix<f64>,
    a_is_pd: bool,
}

impl SchurHessian {
    /// Create a Schur Hessian with `A` of width `l` and `D` of width `r`.
    pub fn new(l: usize, r: usize) -> Self {
        SchurHessian {
            l,
            r,
            a: empty_sparse(l, l),
            b: empty_sparse(l, r),
            d: DMatrix::zeros(r, r),
            a_is_pd: false,
        }
    }

    /// Width of the `A` block.
    pub fn l(&self) -> usize {
        self.l
    }

    /// Width of the `D` block.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Read-only access to the three blocks, for tests and diagnostics.
    pub fn blocks(&self) -> (&SparseColMat<usize, f64>, &SparseColMat<usize, f64>, &DMatrix<f64>) {
        (&self.a, &self.b, &self.d)
    }

    /// Factorize `a` and solve `a * x = rhs` for a (possibly multi-column)
    /// dense right-hand side, with no factorization reuse across calls (see
    /// module docs).
    fn solve_with_a(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>, Error> {
        let rhs_faer = dmatrix_to_faer(rhs);
        let chol = self.a.as_ref().sp_cholesky(Side::Lower).map_err(|_| {
            TrustRegionError::SolverFailure {
                text: "Schur block A is not symmetric positive definite".into(),
            }
        })?;
        let sol = chol.solve(rhs_faer.as_ref());
        Ok(faer_to_dmatrix(sol.as_ref(), rhs.nrows(), rhs.ncols()))
    }
}

impl HessianOps for SchurHessian {
    fn dim(&self) -> usize {
        self.l + self.r
    }

    fn extract_diagonal(&self, d_out: &mut DVector<f64>) {
        for i in 0..self.l {
            d_out[i] = sparse_diag_entry(&self.a, i);
        }
        for i in 0..self.r {
            d_out[self.l + i] = self.d[(i, i)];
        }
    }

    fn set_diagonal(&mut self, d_in: &DVector<f64>) {
        for i in 0..self.l {
            set_sparse_diag_entry(&mut self.a, i, d_in[i]);
        }
        for i in 0..self.r {
            self.d[(i, i)] = d_in[self.l + i];
        }
    }

    fn divide_rows_cols(&mut self, s: &DVector<f64>) {
        let (s_l, s_r) = (s.rows(0, self.l).clone_owned(), s.rows(self.l, self.r).clone_owned());
        scale_sparse_rows_cols(&mut self.a, &s_l, &s_l);
        scale_sparse_rows_cols(&mut self.b, &s_l, &s_r);
        for i in 0..self.r {
            for j in 0..self.r {
                self.d[(i, j)] /= s_r[i] * s_r[j];
            }
        }
    }

    fn inner_vector_hessian(&self, v: &DVector<f64>) -> f64 {
        let v_l = v.rows(0, self.l).clone_owned();
        let v_r = v.rows(self.l, self.r).clone_owned();
        let av_l = sparse_mat_vec(&self.a, &v_l);
        let bv_r = sparse_mat_vec(&self.b, &v_r);
        let v_l_t_a_v_l = v_l.dot(&av_l);
        let v_l_t_b_v_r = v_l.dot(&bv_r);
        let v_r_t_d_v_r = (v_r.transpose() * &self.d * &v_r)[(0, 0)];
        v_l_t_a_v_l + 2.0 * v_l_t_b_v_r + v_r_t_d_v_r
    }

    fn initialize_solver(&mut self) -> bool {
        self.a_is_pd = self.a.as_ref().sp_cholesky(Side::Lower).is_ok();
        self.a_is_pd
    }

    fn solve(&self, g: &DVector<f64>, p: &mut DVector<f64>) -> bool {
        if !self.a_is_pd {
            return false;
        }
        let b1 = g.rows(0, self.l).clone_owned();
        let b2 = g.rows(self.l, self.r).clone_owned();

        let y = match self.solve_with_a(&DMatrix::from_column_slice(self.l, 1, b1.as_slice())) {
            Ok(y) => y,
            Err(_) => return false,
        };
        let y = DVector::from_column_slice(y.column(0).as_slice());

        let b_dense = sparse_to_dense(&self.b, self.l, self.r);
        let b2_prime = &b2 - b_dense.transpose() * &y;

        let m = match self.solve_with_a(&b_dense) {
            Ok(m) => m,
            Err(_) => return false,
        };

        let d_prime = &self.d - b_dense.transpose() * &m;
        let chol_d = match Cholesky::<f64, Dyn>::new(d_prime) {
            Some(c) => c,
            None => return false,
        };
        let x2 = chol_d.solve(&b2_prime);

        let rhs_for_x1 = &b1 - &b_dense * &x2;
        let x1 = match self.solve_with_a(&DMatrix::from_column_slice(self.l, 1, rhs_for_x1.as_slice())) {
            Ok(x1) => x1,
            Err(_) => return false,
        };
        let x1 = DVector::from_column_slice(x1.column(0).as_slice());

        for i in 0..self.l {
            p[i] = x1[i];
        }
        for i in 0..self.r {
            p[self.l + i] = x2[i];
        }
        p.iter().all(|v| v.is_finite())
    }
}

impl FormFromJacobian for SchurHessian {
    type Jacobian = BlockJacobian;

    fn compute_hessian(&mut self, jacobian: &BlockJacobian) -> Result<(), Error> {
        let (j_l, j_r) = jacobian;
        self.a = j_l
            .as_ref()
            .transpose()
            .to_col_major()
            .map_err(|_| TrustRegionError::SolverFailure {
                text: "failed to transpose J_L into column-major form".into(),
            })?
            .as_ref()
            * j_l.as_ref();
        self.b = j_l
            .as_ref()
            .transpose()
            .to_col_major()
            .map_err(|_| TrustRegionError::SolverFailure {
                text: "failed to transpose J_L into column-major form".into(),
            })?
            .as_ref()
            * j_r.as_ref();
        let d_sparse = j_r
            .as_ref()
            .transpose()
            .to_col_major()
            .map_err(|_| TrustRegionError::SolverFailure {
                text: "failed to transpose J_R into column-major form".into(),
            })?
            .as_ref()
            * j_r.as_ref();
        self.d = sparse_to_dense(&d_sparse, self.r, self.r);
        self.a_is_pd = false;
        Ok(())
    }

    fn compute_gradient(
        &self,
        jacobian: &BlockJacobian,
        residuals: &DVector<f64>,
        g: &mut DVector<f64>,
    ) -> Result<(), Error> {
        let (j_l, j_r) = jacobian;
        let g_l = sparse_mat_t_vec(j_l, residuals);
        let g_r = sparse_mat_t_vec(j_r, residuals);
        for i in 0..self.l {
            g[i] = g_l[i];
        }
        for i in 0..self.r {
            g[self.l + i] = g_r[i];
        }
        Ok(())
    }
}

fn empty_sparse(nrows: usize, ncols: usize) -> SparseColMat<usize, f64> {
    SparseColMat::try_new_from_triplets(nrows, ncols, &[])
        .expect("empty triplet list always builds a valid sparse matrix")
}

fn dmatrix_to_faer(m: &DMatrix<f64>) -> faer::Mat<f64> {
    faer::Mat::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)])
}

fn faer_to_dmatrix(m: faer::MatRef<f64>, nrows: usize, ncols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(nrows, ncols, |i, j| m[(i, j)])
}

fn sparse_to_dense(m: &SparseColMat<usize, f64>, nrows: usize, ncols: usize) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(nrows, ncols);
    let m_ref = m.as_ref();
    for j in 0..ncols {
        let rows = m_ref.row_indices_of_col(j);
        let vals = m_ref.values_of_col(j);
        for (row, &val) in rows.zip(vals.iter()) {
            out[(row, j)] += val;
        }
    }
    out
}

fn sparse_diag_entry(m: &SparseColMat<usize, f64>, i: usize) -> f64 {
    let m_ref = m.as_ref();
    let rows = m_ref.row_indices_of_col(i);
    let vals = m_ref.values_of_col(i);
    for (row, &val) in rows.zip(vals.iter()) {
        if row == i {
            return val;
        }
    }
    0.0
}

fn set_sparse_diag_entry(m: &mut SparseColMat<usize, f64>, i: usize, value: f64) {
    let mut m_ref = m.as_mut();
    let rows: Vec<usize> = m_ref.rb().row_indices_of_col(i).collect();
    let vals = m_ref.rb_mut().values_of_col_mut(i);
    for (slot, row) in vals.iter_mut().zip(rows.iter()) {
        if *row == i {
            *slot = value;
            return;
        }
    }
}

fn scale_sparse_rows_cols(m: &mut SparseColMat<usize, f64>, s_rows: &DVector<f64>, s_cols: &DVector<f64>) {
    let ncols = m.ncols();
    let mut m_ref = m.as_mut();
    for j in 0..ncols {
        let rows: Vec<usize> = m_ref.rb().row_indices_of_col(j).collect();
        let vals = m_ref.rb_mut().values_of_col_mut(j);
        for (slot, &row) in vals.iter_mut().zip(rows.iter()) {
            *slot /= s_rows[row] * s_cols[j];
        }
    }
}

fn sparse_mat_vec(m: &SparseColMat<usize, f64>, v: &DVector<f64>) -> DVector<f64> {
    let v_faer = faer::Mat::from_fn(v.len(), 1, |i, _| v[i]);
    let out = m.as_ref() * v_faer.as_ref();
    DVector::from_column_slice(out.col_as_slice(0))
}

fn sparse_mat_t_vec(m: &SparseColMat<usize, f64>, v: &DVector<f64>) -> DVector<f64> {
    let v_faer = faer::Mat::from_fn(v.len(), 1, |i, _| v[i]);
    let out = m
        .as_ref()
        .transpose()
        .to_col_major()
        .expect("transpose of a valid CSC matrix always recompresses")
        .as_ref()
        * v_faer.as_ref();
    DVector::from_column_slice(out.col_as_slice(0))
}
