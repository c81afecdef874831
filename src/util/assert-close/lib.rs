/* ************************************************************************ **
** This file is part of mlpot, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of mlpot is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! Approximate equality assertions for floating point data.
//!
//! ```
//! # #[macro_use] extern crate mlpot_assert_close;
//! # fn main() {
//! assert_close!(1.0, 1.0 + 1e-12);
//! assert_close!(rel=1e-5, abs=1e-10, vec![1.0, 2.0], vec![1.000001, 2.0]);
//! # }
//! ```

use std::fmt;
use ndarray::{ArrayBase, Data, Dimension};

pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::assert_close_impl!{@parsing [$($t)*] [[@rel $crate::DEFAULT_NONZERO_TOL] [@abs 0.0]]}
    };
}

#[macro_export]
macro_rules! debug_assert_close {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)] {
            $crate::assert_close!{$($t)*}
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! assert_close_impl {
    (@parsing [rel=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@rel $tol]]);
    };
    (@parsing [abs=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@abs $tol]]);
    };
    (@parsing [$a:expr, $b:expr $(,)*] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt "not nearly equal!"])
    };
    (@parsing [$a:expr, $b:expr, $($fmt:tt)+] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt $($fmt)+])
    };
    (@expand [$($assignment:tt)*] [@comp $a:expr, $b:expr] [@fmt $($fmt:tt)+] ) => {
        #[allow(unused_mut)]
        #[allow(unused_assignments)]
        {
            let a = $a;
            let b = $b;

            let mut abs;
            let mut rel;
            $(
                $crate::assert_close_impl!{@stmt::assign [abs, rel] $assignment}
            )*

            if let Err(e) = $crate::CheckClose::check_close(&a, &b, $crate::Tolerances { abs, rel }) {
                panic!(
                "{} (tolerances: rel={}, abs={})\n left: {:?}\nright: {:?}\n{}",
                 format!($($fmt)*), rel, abs, a, b, e);
            }
        }
    };
    (@stmt::assign [$abs:ident, $rel:ident] [@abs $tol:expr]) => { $abs = $tol; };
    (@stmt::assign [$abs:ident, $rel:ident] [@rel $tol:expr]) => { $rel = $tol; };
}

#[doc(hidden)]
#[inline]
pub fn __is_close(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    // Same semantics as Python's math.isclose.
    assert!(rel >= 0.0);
    assert!(abs >= 0.0);

    // catch infinities of same sign
    if a == b { return true; }

    // catch infinities of opposite sign, avoiding infinite relative tolerance
    if a.is_infinite() || b.is_infinite() { return false; }

    // case for general values and NaN.
    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Copy, Clone)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckCloseError {
    #[error("failed at index {index}:\n  left: {left:?}\n right: {right:?}\n   tol: {tol:?}")]
    Values {
        index: usize,
        left: f64,
        right: f64,
        tol: Tolerances,
    },
    #[error("shape mismatch: {left:?} vs {right:?}")]
    Shape {
        left: Vec<usize>,
        right: Vec<usize>,
    },
}

impl CheckCloseError {
    fn at_index(self, offset: usize) -> Self {
        match self {
            CheckCloseError::Values { index, left, right, tol } => {
                CheckCloseError::Values { index: index + offset, left, right, tol }
            },
            other => other,
        }
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    #[inline]
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        match __is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError::Values { index: 0, left: *self, right: *other, tol }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { CheckClose::check_close(*self, *other, tol) }
}

impl CheckClose for [f64] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        if self.len() != other.len() {
            return Err(CheckCloseError::Shape { left: vec![self.len()], right: vec![other.len()] });
        }
        check_iter(self.iter().cloned(), other.iter().cloned(), tol)
    }
}

impl<const N: usize> CheckClose for [f64; N] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl<const N: usize> CheckClose for [[f64; N]] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        if self.len() != other.len() {
            return Err(CheckCloseError::Shape { left: vec![self.len(), N], right: vec![other.len(), N] });
        }
        check_iter(
            self.iter().flat_map(|row| row.iter().cloned()),
            other.iter().flat_map(|row| row.iter().cloned()),
            tol,
        )
    }
}

impl CheckClose for Vec<f64> {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl<const N: usize> CheckClose for Vec<[f64; N]> {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

// Compares elements in logical (row-major) order regardless of memory layout.
impl<S1, S2, D> CheckClose<ArrayBase<S2, D>> for ArrayBase<S1, D>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    fn check_close(&self, other: &ArrayBase<S2, D>, tol: Tolerances) -> Result<(), CheckCloseError> {
        if self.shape() != other.shape() {
            return Err(CheckCloseError::Shape {
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        check_iter(self.iter().cloned(), other.iter().cloned(), tol)
    }
}

fn check_iter(
    a: impl Iterator<Item = f64>,
    b: impl Iterator<Item = f64>,
    tol: Tolerances,
) -> Result<(), CheckCloseError> {
    for (index, (a, b)) in a.zip(b).enumerate() {
        a.check_close(&b, tol).map_err(|e| e.at_index(index))?;
    }
    Ok(())
}

impl fmt::Display for Tolerances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rel={}, abs={}", self.rel, self.abs)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use ndarray::{arr1, arr2};

    #[test]
    fn macro_output_can_compile() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(1.0, 1.0,);
        assert_close!(abs=1e-8, 1.0, 1.0,);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0, "{}", "with a message");
    }

    #[test]
    fn arrays_and_slices() {
        assert_close!(vec![1.0, 2.0], vec![1.0, 2.0 + 1e-12]);
        assert_close!([[1.0, 0.0, 0.0]], [[1.0, 0.0, 0.0]]);
        assert_close!(arr2(&[[1.0, 2.0], [3.0, 4.0]]), arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        assert_close!(abs=1e-3, arr1(&[0.0, 1.0]).view(), arr1(&[1e-4, 1.0]));
    }

    #[test]
    #[should_panic]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn shape_mismatch() {
        assert_close!(arr1(&[1.0, 2.0]), arr1(&[1.0]));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn debug_not_close() {
        debug_assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }
}
