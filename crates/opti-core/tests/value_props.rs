use std::cmp::Ordering;

use opti_core::{check_range, compare, convert_to, is_in_range, ParameterType, Value, ValueRange};
use proptest::prelude::*;

proptest! {
    #[test]
    fn int_to_double_promotion_is_value_preserving(v in any::<i64>()) {
        let promoted = convert_to(ParameterType::Double, Some(Value::Int(v))).unwrap();
        prop_assert_eq!(promoted, Some(Value::Double(v as f64)));
    }

    #[test]
    fn int_conversion_is_identity(v in any::<i64>()) {
        let converted = convert_to(ParameterType::Int, Some(Value::Int(v))).unwrap();
        prop_assert_eq!(converted, Some(Value::Int(v)));
    }

    #[test]
    fn normalized_range_is_ordered(a in any::<i64>(), b in any::<i64>()) {
        let range = ValueRange::new(Some(Value::Int(a)), Some(Value::Int(b)));
        match check_range(ParameterType::Int, Some(range)) {
            Ok(Some(r)) => {
                let lo = r.lower.unwrap();
                let hi = r.upper.unwrap();
                prop_assert_ne!(compare(&lo, &hi), Some(Ordering::Greater));
            }
            Ok(None) => prop_assert!(false, "bounded range normalized to absent"),
            Err(_) => prop_assert!(a > b),
        }
    }

    #[test]
    fn values_inside_bounds_pass_range_check(lo in -1000i64..0, hi in 0i64..1000, v in -1000i64..1000) {
        let range = ValueRange::new(Some(Value::Int(lo)), Some(Value::Int(hi)));
        let inside = v >= lo && v <= hi;
        prop_assert_eq!(is_in_range(Some(&range), Some(&Value::Int(v))), inside);
    }

    #[test]
    fn absent_value_always_passes(lo in any::<i64>(), hi in any::<i64>()) {
        let range = ValueRange::new(Some(Value::Int(lo.min(hi))), Some(Value::Int(lo.max(hi))));
        prop_assert!(is_in_range(Some(&range), None));
    }
}
