//! Unit newtypes for road quantities.
//!
//! Edge lengths arrive in meters, speeds in km/h and travel times are reported
//! in hours. Keeping those apart at the type level stops the classic
//! "meters divided by km/h" slip in travel time computations.
//!
//! ```
//! use ra2ce_core::units::{Hours, KilometersPerHour, Meters};
//!
//! let length = Meters(420.0);
//! let time: Hours = length.to_kilometers() / KilometersPerHour(0.42);
//! assert!((time.value() - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.3} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_nan(self) -> bool {
                self.0.is_nan()
            }

            /// Positive and finite; the only values usable as a divisor.
            #[inline]
            pub fn is_positive(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Edge length in meters (the `length` attribute of a road edge).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

/// Distance in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilometers(pub f64);

impl_unit_ops!(Kilometers, "km");

/// Speed in km/h (the `avgspeed` attribute of a road edge).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KilometersPerHour(pub f64);

impl_unit_ops!(KilometersPerHour, "km/h");

/// Travel time in hours (the `time` attribute of a road edge).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Hours(pub f64);

impl_unit_ops!(Hours, "h");

const MPH_TO_KMH: f64 = 1.609344;

impl Meters {
    #[inline]
    pub fn to_kilometers(self) -> Kilometers {
        Kilometers(self.0 * 1e-3)
    }
}

impl Kilometers {
    #[inline]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 * 1e3)
    }
}

impl KilometersPerHour {
    #[inline]
    pub fn from_mph(mph: f64) -> Self {
        KilometersPerHour(mph * MPH_TO_KMH)
    }
}

/// Travel time over a distance. Yields NaN when the speed is not positive.
impl Div<KilometersPerHour> for Kilometers {
    type Output = Hours;
    fn div(self, rhs: KilometersPerHour) -> Hours {
        if rhs.is_positive() {
            Hours(self.0 / rhs.0)
        } else {
            Hours(f64::NAN)
        }
    }
}

/// Distance covered in a given time.
impl Mul<KilometersPerHour> for Hours {
    type Output = Kilometers;
    fn mul(self, rhs: KilometersPerHour) -> Kilometers {
        Kilometers(self.0 * rhs.0)
    }
}
