//! Truthiness of probe values.
//!
//! Browser test helpers treat any "present" value as success: non-zero
//! numbers, non-empty strings and collections, `Some(_)`. [`Truthy`] is the
//! typed version of that rule, so a probe can hand back the value it found
//! and the poller returns it unchanged.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// A value that can satisfy a wait condition.
pub trait Truthy {
    /// Whether this value counts as "satisfied".
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        false
    }
}

impl Truthy for char {
    fn is_truthy(&self) -> bool {
        true
    }
}

macro_rules! impl_truthy_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Truthy for $t {
                fn is_truthy(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

impl_truthy_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T> Truthy for [T] {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for VecDeque<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V, S> Truthy for HashMap<K, V, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T, S> Truthy for HashSet<T, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Truthy for BTreeMap<K, V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

/// JSON values follow browser rules: objects and arrays are always truthy.
impl Truthy for serde_json::Value {
    fn is_truthy(&self) -> bool {
        use serde_json::Value;
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f.is_truthy()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Box<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Rc<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Arc<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    mod primitive_tests {
        use super::*;

        #[test]
        fn test_bool() {
            assert!(true.is_truthy());
            assert!(!false.is_truthy());
        }

        #[test]
        fn test_unit_is_falsy() {
            assert!(!().is_truthy());
        }

        #[test]
        fn test_floats() {
            assert!(1.5_f64.is_truthy());
            assert!(!0.0_f64.is_truthy());
            assert!(!(-0.0_f32).is_truthy());
            assert!(!f64::NAN.is_truthy());
            assert!(f64::INFINITY.is_truthy());
        }

        #[test]
        fn test_strings() {
            assert!("ready".is_truthy());
            assert!(!"".is_truthy());
            assert!(String::from("x").is_truthy());
            assert!(!String::new().is_truthy());
        }
    }

    mod container_tests {
        use super::*;

        #[test]
        fn test_option() {
            assert!(Some(0).is_truthy());
            assert!(!None::<u8>.is_truthy());
        }

        #[test]
        fn test_collections() {
            assert!(vec![1].is_truthy());
            assert!(!Vec::<u8>::new().is_truthy());
            assert!(!HashMap::<String, u8>::new().is_truthy());
            let mut map = BTreeMap::new();
            map.insert("k", 1);
            assert!(map.is_truthy());
        }

        #[test]
        fn test_pointers_delegate() {
            assert!(Arc::new(7_u32).is_truthy());
            assert!(!Box::new(0_i64).is_truthy());
            assert!(!Rc::new(String::new()).is_truthy());
        }
    }

    mod json_tests {
        use super::*;

        #[test]
        fn test_json_falsy_values() {
            assert!(!json!(null).is_truthy());
            assert!(!json!(false).is_truthy());
            assert!(!json!(0).is_truthy());
            assert!(!json!("").is_truthy());
        }

        #[test]
        fn test_json_objects_and_arrays_always_truthy() {
            assert!(json!({}).is_truthy());
            assert!(json!([]).is_truthy());
            assert!(json!({"ok": true}).is_truthy());
        }
    }

    proptest! {
        #[test]
        fn prop_integer_truthy_iff_nonzero(n in any::<i64>()) {
            prop_assert_eq!(n.is_truthy(), n != 0);
        }

        #[test]
        fn prop_string_truthy_iff_nonempty(s in ".*") {
            prop_assert_eq!(s.is_truthy(), !s.is_empty());
        }

        #[test]
        fn prop_json_number_matches_native(n in any::<i32>()) {
            prop_assert_eq!(json!(n).is_truthy(), n.is_truthy());
        }
    }
}
