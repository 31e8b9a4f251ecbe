use ra2ce_core::{AttrValue, Ra2ceError, Ra2ceResult};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign};

/// Traffic attributed to one edge under three accounting schemes.
///
/// All operators are component-wise; an `f64` operand is broadcast to the
/// three components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccumulatedTraffic {
    pub utilitarian: f64,
    pub egalitarian: f64,
    pub prioritarian: f64,
}

impl AccumulatedTraffic {
    pub const ZERO: AccumulatedTraffic = AccumulatedTraffic::splat(0.0);
    pub const ONE: AccumulatedTraffic = AccumulatedTraffic::splat(1.0);

    pub const fn new(utilitarian: f64, egalitarian: f64, prioritarian: f64) -> Self {
        Self {
            utilitarian,
            egalitarian,
            prioritarian,
        }
    }

    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Adds a dynamic attribute value. Only numbers are accepted.
    pub fn checked_add(self, rhs: &AttrValue) -> Ra2ceResult<Self> {
        Ok(self + numeric_operand("+", rhs)?)
    }

    /// Multiplies by a dynamic attribute value. Only numbers are accepted.
    pub fn checked_mul(self, rhs: &AttrValue) -> Ra2ceResult<Self> {
        Ok(self * numeric_operand("*", rhs)?)
    }
}

fn numeric_operand(op: &str, rhs: &AttrValue) -> Ra2ceResult<f64> {
    match rhs {
        AttrValue::Number(value) => Ok(*value),
        other => Err(Ra2ceError::TypeMismatch(format!(
            "unsupported operand type for {op}: AccumulatedTraffic and {}",
            other.type_name()
        ))),
    }
}

impl Add for AccumulatedTraffic {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.utilitarian + rhs.utilitarian,
            self.egalitarian + rhs.egalitarian,
            self.prioritarian + rhs.prioritarian,
        )
    }
}

impl Add<f64> for AccumulatedTraffic {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        self + Self::splat(rhs)
    }
}

impl Mul for AccumulatedTraffic {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.utilitarian * rhs.utilitarian,
            self.egalitarian * rhs.egalitarian,
            self.prioritarian * rhs.prioritarian,
        )
    }
}

impl Mul<f64> for AccumulatedTraffic {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self * Self::splat(rhs)
    }
}

impl AddAssign for AccumulatedTraffic {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl AddAssign<f64> for AccumulatedTraffic {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl MulAssign for AccumulatedTraffic {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl MulAssign<f64> for AccumulatedTraffic {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl std::iter::Sum for AccumulatedTraffic {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_is_associative_and_commutative() {
        let a = AccumulatedTraffic::new(1.0, 2.0, 3.0);
        let b = AccumulatedTraffic::new(0.5, 0.25, 4.0);
        let c = AccumulatedTraffic::new(8.0, 1.0, 0.0);
        assert_eq!(a + b, b + a);
        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!(a + AccumulatedTraffic::ZERO, a);
    }

    #[test]
    fn test_scalar_broadcast() {
        let a = AccumulatedTraffic::new(1.0, 2.0, 3.0);
        assert_eq!(a * 1.0, a);
        assert_eq!(a * 2.0, AccumulatedTraffic::new(2.0, 4.0, 6.0));
        assert_eq!(a + 1.0, AccumulatedTraffic::new(2.0, 3.0, 4.0));
        assert_eq!(a * AccumulatedTraffic::ONE, a);
    }

    #[test]
    fn test_assign_operators() {
        let mut a = AccumulatedTraffic::ONE;
        a *= AccumulatedTraffic::new(2.0, 3.0, 4.0);
        a += 1.0;
        assert_eq!(a, AccumulatedTraffic::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_non_numeric_operand_is_rejected() {
        let a = AccumulatedTraffic::default();
        let err = a.checked_mul(&AttrValue::from("x")).unwrap_err();
        assert!(matches!(err, Ra2ceError::TypeMismatch(_)));
        assert!(a.checked_add(&AttrValue::Null).is_err());
        assert_eq!(
            a.checked_add(&AttrValue::from(2.0)).unwrap(),
            AccumulatedTraffic::splat(2.0)
        );
    }
}
