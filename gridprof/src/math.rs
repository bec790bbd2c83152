use num_traits::{Float, FromPrimitive};

pub fn linspace<T>(y_start: T, y_end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let dy = if n > 1 {
        (y_end - y_start) / T::from(n - 1).unwrap()
    } else {
        T::zero()
    };
    (0..n).map(move |x| y_start + T::from(x).unwrap() * dy)
}

/// Arithmetic mean of `values`, `None` if empty.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float + FromPrimitive,
{
    if values.is_empty() {
        None
    } else {
        let sum = values.iter().fold(T::zero(), |acc, v| acc + *v);
        T::from_usize(values.len()).map(|n| sum / n)
    }
}

/// Linearly interpolates `y` at `x` over the points `(xs, ys)`.
///
/// `xs` must be sorted ascending. Returns NaN outside `[xs[0],
/// xs[len - 1]]`.
pub fn interpolate<T>(xs: &[T], ys: &[T], x: T) -> T
where
    T: Float,
{
    let (Some(&lo), Some(&hi)) = (xs.first(), xs.last()) else {
        return T::nan();
    };
    if x < lo || x > hi {
        return T::nan();
    }
    // First index whose x is >= the target.
    let upper = xs.partition_point(|v| *v < x);
    if upper == 0 {
        return ys[0];
    }
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    if x1 == x0 {
        y1
    } else {
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}
