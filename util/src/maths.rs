//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is 
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T> 
where
    T: Float + std::ops::AddAssign
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let mut sum = T::zero();

    for i in 0..point_0.len() {
        sum += (point_0[i] - point_1[i]).powi(2);
    }

    Some(sum.sqrt())
}

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Limit a value which is expected to lie in `[-1, 1]`, such as the argument
/// of `acos` or `asin`.
///
/// Values outside the range by no more than `slack` are clamped onto the
/// boundary, values further out than that return `None`. NaN always returns
/// `None`.
pub fn clamp_unit_with_slack<T>(value: T, slack: T) -> Option<T>
where
    T: Float
{
    let one = T::one();

    if value.is_nan() || value.abs() > one + slack {
        None
    }
    else {
        Some(clamp(value, -one, one))
    }
}
