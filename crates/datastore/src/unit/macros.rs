//! Data unit macros
//!
//! Use declarative macros to eliminate the repeated downcast boilerplate per variant

/// Implement [`UnitVariant`](super::UnitVariant) for one concrete representation
///
/// # Usage
/// ```ignore
/// impl_unit_variant!(
///     Timeseries<f32>,   // Concrete representation
///     SeriesF32          // DataUnit / UnitKind variant
/// );
/// ```
macro_rules! impl_unit_variant {
    ($ty:ty, $variant:ident) => {
        impl UnitVariant for $ty {
            const KIND: UnitKind = UnitKind::$variant;

            #[inline]
            fn from_unit(unit: &DataUnit) -> Option<&Self> {
                match unit {
                    DataUnit::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            #[inline]
            fn from_unit_mut(unit: &mut DataUnit) -> Option<&mut Self> {
                match unit {
                    DataUnit::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            #[inline]
            fn into_unit(self) -> DataUnit {
                DataUnit::$variant(self)
            }

            fn empty(name: &str, units: &str) -> Self {
                <$ty>::new(name, units)
            }
        }

        impl From<$ty> for DataUnit {
            fn from(inner: $ty) -> Self {
                DataUnit::$variant(inner)
            }
        }
    };
}
