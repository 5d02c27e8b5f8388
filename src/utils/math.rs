use std::{cmp::Ordering, ops::AddAssign};

use num::Num;

/// 疎ベクトル
/// Non-zero entries of a vector, indices strictly ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVec<N> {
    pub inds: Vec<usize>,
    pub vals: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    pub fn new() -> Self {
        Self {
            inds: Vec::new(),
            vals: Vec::new(),
        }
    }

    /// Collect the non-zero entries of a dense iterator
    pub fn from_dense<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = N>,
    {
        let mut vec = Self::new();
        for (idx, val) in iter.into_iter().enumerate() {
            if !val.is_zero() {
                vec.inds.push(idx);
                vec.vals.push(val);
            }
        }
        vec
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    /// Dot product by merge-join over the two index lists
    ///
    /// # Arguments
    /// * `other` - 他のベクトル
    ///
    /// # Returns
    /// * `R` - ドット積の結果
    #[inline]
    pub fn dot<R>(&self, other: &Self) -> R
    where
        R: Num + AddAssign,
        N: Into<R>,
    {
        let mut result = R::zero();
        if self.nnz() == 0 || other.nnz() == 0 {
            return result;
        }
        let mut i = 0;
        let mut j = 0;
        while i < self.nnz() && j < other.nnz() {
            match self.inds[i].cmp(&other.inds[j]) {
                Ordering::Equal => {
                    result += self.vals[i].into() * other.vals[j].into();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    #[inline]
    pub fn norm_sq<R>(&self) -> R
    where
        R: Num + AddAssign + Copy,
        N: Into<R>,
    {
        let mut result = R::zero();
        for &v in &self.vals {
            let v: R = v.into();
            result += v * v;
        }
        result
    }
}

/// cosθ = A・B / (|A||B|)
/// Zero-magnitude on either side yields 0 instead of NaN.
#[inline]
pub fn cosine<N>(a: &SparseVec<N>, b: &SparseVec<N>) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let denom = (a.norm_sq::<f64>() * b.norm_sq::<f64>()).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    a.dot::<f64>(b) / denom
}

/// Dense dot product, shorter slice bounds the length
#[inline]
pub fn dot_dense(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
