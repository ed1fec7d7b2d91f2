//! Human readable filter state.
//!
//! A filter displays as a JSON like object of its matrices, vectors and last parameters, keyed by name in
//! alphabetical order. A 1x1 value displays as a scalar, a column vector as a list and a matrix as a list of rows.

use std::fmt;

use na::storage::Storage;
use na::{DefaultAllocator, Dim, Matrix, RealField};
use nalgebra as na;

use crate::bindings::Pack;
use crate::dimensions::KalmanAllocator;
use crate::kalman::Kalman;

struct Value<'a, N: RealField, R: Dim, C: Dim, S: Storage<N, R, C>>(&'a Matrix<N, R, C, S>);

impl<'a, N: RealField + fmt::Display, R: Dim, C: Dim, S: Storage<N, R, C>> fmt::Display for Value<'a, N, R, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        if m.nrows() == 1 && m.ncols() == 1 {
            return write!(f, "{}", m[(0, 0)]);
        }
        if m.ncols() == 1 {
            return write_row(f, m.iter());
        }
        write!(f, "[")?;
        for (i, row) in m.row_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write_row(f, row.iter())?;
        }
        write!(f, "]")
    }
}

fn write_row<'a, N: RealField + fmt::Display>(f: &mut fmt::Formatter<'_>, values: impl Iterator<Item = &'a N>) -> fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value)?;
    }
    write!(f, "]")
}

fn write_pack<P: Pack>(f: &mut fmt::Formatter<'_>, name: &str, pack: Option<&P>) -> fmt::Result {
    if let Some(pack) = pack {
        for (i, value) in pack.describe().iter().enumerate() {
            write!(f, "\"{}_{}\": {}, ", name, i, value)?;
        }
    }
    Ok(())
}

impl<N: RealField + fmt::Display, D: Dim, ZD: Dim, UD: Dim, UP: Pack, PP: Pack> fmt::Display for Kalman<N, D, ZD, UD, UP, PP>
where
    DefaultAllocator: KalmanAllocator<N, D, ZD, UD>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = self.dimensions().has_input();

        write!(f, "{{\"f\": {}, ", Value(self.f()))?;
        if input {
            write!(f, "\"g\": {}, ", Value(self.g()))?;
        }
        write!(f, "\"h\": {}, \"k\": {}, \"p\": {}, ", Value(self.h()), Value(self.k()), Value(self.p()))?;
        write_pack(f, "prediction", self.prediction_arguments())?;
        write!(f, "\"q\": {}, \"r\": {}, \"s\": {}, ", Value(self.q()), Value(self.r()), Value(self.s()))?;
        if input {
            write!(f, "\"u\": {}, ", Value(self.u()))?;
        }
        write_pack(f, "update", self.update_arguments())?;
        write!(f, "\"x\": {}, \"y\": {}, \"z\": {}}}", Value(self.x()), Value(self.y()), Value(self.z()))
    }
}
