//! stepseq Core - Fundamental types
//!
//! This crate provides the core types used throughout stepseq:
//! - `Number`: exact integers or f64 reals
//! - `NumericMode`: integer vs real policy (equality, division, coercion)
//! - `EvalError`: structured errors from custom step expressions

mod number;
mod mode;
mod error;

pub use number::{Number, NumberError, MAX_EXACT_EXPONENT};
pub use mode::{NumericMode, REAL_TOLERANCE};
pub use error::{EvalError, ErrorContext, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, NumberError, NumericMode, EvalError};
    pub use crate::error::codes;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_parse_int() {
            let n = Number::parse_int(" -42 ").unwrap();
            assert_eq!(n.to_i64(), Some(-42));
            assert_eq!(Number::parse_int("+7").unwrap().to_i64(), Some(7));
            assert!(Number::parse_int("3.5").is_err());
            assert!(Number::parse_int("").is_err());
        }

        #[test]
        fn test_parse_int_unbounded() {
            let n = Number::parse_int("123456789012345678901234567890").unwrap();
            assert!(n.is_integer());
            assert_eq!(n.to_i64(), None);
            assert_eq!(n.to_string(), "123456789012345678901234567890");
        }

        #[test]
        fn test_parse_real() {
            assert_eq!(Number::parse_real("2.5").unwrap().to_f64(), 2.5);
            assert_eq!(Number::parse_real("1e-3").unwrap().to_f64(), 0.001);
            assert!(Number::parse_real("abc").is_err());
        }

        #[test]
        fn test_parse_literal() {
            assert!(Number::parse_literal("10").unwrap().is_integer());
            assert!(!Number::parse_literal("10.0").unwrap().is_integer());
            assert!(!Number::parse_literal("1e3").unwrap().is_integer());
        }

        #[test]
        fn test_int_arithmetic_stays_exact() {
            let a = Number::from_i64(6);
            let b = Number::from_i64(7);
            assert_eq!(a.mul(&b).to_i64(), Some(42));
            assert_eq!(a.add(&b).to_i64(), Some(13));
            assert_eq!(a.sub(&b).to_i64(), Some(-1));
        }

        #[test]
        fn test_mixed_arithmetic_is_real() {
            let a = Number::from_i64(1);
            let b = Number::from_f64(0.5);
            let sum = a.add(&b);
            assert!(!sum.is_integer());
            assert_eq!(sum.to_f64(), 1.5);
        }

        #[test]
        fn test_checked_div_is_real() {
            let result = Number::from_i64(7).checked_div(&Number::from_i64(2)).unwrap();
            assert_eq!(result, Number::from_f64(3.5));
            assert!(!result.is_integer());
        }

        #[test]
        fn test_div_by_zero() {
            let a = Number::from_i64(42);
            let zero = Number::from_i64(0);
            assert_eq!(a.checked_div(&zero), Err(NumberError::DivisionByZero));
            assert_eq!(a.floor_div(&zero), Err(NumberError::DivisionByZero));
            assert_eq!(a.rem(&zero), Err(NumberError::DivisionByZero));
            assert!(Number::from_f64(1.0).checked_div(&Number::from_f64(0.0)).is_err());
        }

        #[test]
        fn test_floor_div_rounds_down() {
            let fd = |a: i64, b: i64| {
                Number::from_i64(a).floor_div(&Number::from_i64(b)).unwrap().to_i64()
            };
            assert_eq!(fd(7, 2), Some(3));
            assert_eq!(fd(-7, 2), Some(-4));
            assert_eq!(fd(7, -2), Some(-4));
            assert_eq!(fd(-7, -2), Some(3));
            assert_eq!(fd(6, 3), Some(2));
        }

        #[test]
        fn test_rem_sign_follows_divisor() {
            let rem = |a: i64, b: i64| {
                Number::from_i64(a).rem(&Number::from_i64(b)).unwrap().to_i64()
            };
            assert_eq!(rem(7, 3), Some(1));
            assert_eq!(rem(-7, 3), Some(2));
            assert_eq!(rem(7, -3), Some(-2));
            let r = Number::from_f64(-1.5).rem(&Number::from_f64(1.0)).unwrap();
            assert_eq!(r.to_f64(), 0.5);
        }

        #[test]
        fn test_pow_exact() {
            let r = Number::from_i64(2).pow(&Number::from_i64(100)).unwrap();
            assert!(r.is_integer());
            assert_eq!(r.to_string(), "1267650600228229401496703205376");
        }

        #[test]
        fn test_pow_negative_exponent() {
            let r = Number::from_i64(2).pow(&Number::from_i64(-2)).unwrap();
            assert_eq!(r, Number::from_f64(0.25));
            assert_eq!(
                Number::from_i64(0).pow(&Number::from_i64(-1)),
                Err(NumberError::DivisionByZero)
            );
        }

        #[test]
        fn test_pow_limits() {
            let huge = Number::from_i64(MAX_EXACT_EXPONENT as i64 + 1);
            assert_eq!(Number::from_i64(2).pow(&huge), Err(NumberError::Overflow));
            assert!(Number::from_f64(-8.0).pow(&Number::from_f64(0.5)).is_err());
            assert_eq!(
                Number::from_f64(10.0).pow(&Number::from_f64(400.0)),
                Err(NumberError::Overflow)
            );
        }

        #[test]
        fn test_trunc_floor_ceil_round() {
            let x = Number::from_f64(-2.5);
            assert_eq!(x.trunc().unwrap().to_i64(), Some(-2));
            assert_eq!(x.floor().unwrap().to_i64(), Some(-3));
            assert_eq!(x.ceil().unwrap().to_i64(), Some(-2));
            assert_eq!(x.round().unwrap().to_i64(), Some(-2));
            assert_eq!(Number::from_f64(3.5).round().unwrap().to_i64(), Some(4));
        }

        #[test]
        fn test_trunc_non_finite() {
            assert_eq!(Number::from_f64(f64::INFINITY).trunc(), Err(NumberError::Overflow));
            assert!(matches!(
                Number::from_f64(f64::NAN).trunc(),
                Err(NumberError::DomainError(_))
            ));
        }

        #[test]
        fn test_trunc_large_real() {
            let n = Number::from_f64(1e20).trunc().unwrap();
            assert_eq!(n.to_string(), "100000000000000000000");
        }

        #[test]
        fn test_sqrt() {
            assert_eq!(Number::from_i64(9).sqrt().unwrap(), Number::from_f64(3.0));
            assert!(Number::from_i64(-4).sqrt().is_err());
        }

        #[test]
        fn test_neg_abs() {
            assert_eq!(Number::from_i64(-42).abs().to_i64(), Some(42));
            assert_eq!(Number::from_i64(42).neg().to_i64(), Some(-42));
            assert_eq!(Number::from_f64(-1.5).abs().to_f64(), 1.5);
        }

        #[test]
        fn test_display() {
            assert_eq!(Number::from_i64(-3).to_string(), "-3");
            assert_eq!(Number::from_f64(2.0).to_string(), "2.0");
            assert_eq!(Number::from_f64(0.1).to_string(), "0.1");
            assert_eq!(Number::from_f64(f64::NEG_INFINITY).to_string(), "-inf");
            assert_eq!(Number::from_f64(1e16).to_string(), "1e+16");
            assert_eq!(Number::from_f64(-2.5e100).to_string(), "-2.5e+100");
            assert_eq!(Number::from_f64(1e-7).to_string(), "1e-07");
            assert_eq!(Number::from_f64(0.0001).to_string(), "0.0001");
        }

        #[test]
        fn test_ordering_across_variants() {
            assert!(Number::from_i64(3) > Number::from_f64(2.5));
            assert!(Number::from_f64(-0.5) < Number::from_i64(0));
            assert_eq!(Number::from_i64(2), Number::from_f64(2.0));
        }

        #[test]
        fn test_serialize() {
            let json = serde_json::to_string(&vec![
                Number::from_i64(5),
                Number::from_f64(0.5),
                Number::parse_int("99999999999999999999").unwrap(),
            ])
            .unwrap();
            assert_eq!(json, r#"[5,0.5,"99999999999999999999"]"#);
        }
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn test_integer_equal_is_exact() {
            let mode = NumericMode::Integer;
            assert!(mode.equal(&Number::from_i64(5), &Number::from_i64(5)));
            assert!(!mode.equal(&Number::from_i64(5), &Number::from_i64(6)));
        }

        #[test]
        fn test_real_equal_within_tolerance() {
            let mode = NumericMode::Real;
            let a = Number::from_f64(0.1 + 0.2);
            let b = Number::from_f64(0.3);
            assert!(mode.equal(&a, &b));
            assert!(mode.equal(&Number::from_f64(1.0), &Number::from_f64(1.0 + 5e-10)));
            assert!(!mode.equal(&Number::from_f64(1.0), &Number::from_f64(1.0 + 1e-8)));
        }

        #[test]
        fn test_divide_per_mode() {
            let a = Number::from_i64(-7);
            let b = Number::from_i64(2);
            assert_eq!(NumericMode::Integer.divide(&a, &b).unwrap().to_i64(), Some(-4));
            assert_eq!(NumericMode::Real.divide(&a, &b).unwrap().to_f64(), -3.5);
            assert_eq!(
                NumericMode::Integer.divide(&a, &Number::from_i64(0)),
                Err(NumberError::DivisionByZero)
            );
        }

        #[test]
        fn test_coerce() {
            let v = NumericMode::Integer.coerce(Number::from_f64(-3.9)).unwrap();
            assert_eq!(v.to_i64(), Some(-3));
            let r = NumericMode::Real.coerce(Number::from_i64(4)).unwrap();
            assert!(!r.is_integer());
            assert_eq!(r.to_f64(), 4.0);
        }

        #[test]
        fn test_parse_and_accepts() {
            let n = NumericMode::Integer.parse("12").unwrap();
            assert!(NumericMode::Integer.accepts(&n));
            assert!(!NumericMode::Real.accepts(&n));
            assert!(NumericMode::Integer.parse("1.5").is_err());
            assert!(NumericMode::Real.accepts(&NumericMode::Real.parse("12").unwrap()));
        }

        #[test]
        fn test_mode_serde_names() {
            let mode: NumericMode = serde_json::from_str("\"integer\"").unwrap();
            assert_eq!(mode, NumericMode::Integer);
            assert_eq!(NumericMode::default(), NumericMode::Real);
            assert_eq!(NumericMode::Real.to_string(), "real");
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_construction() {
            let err = EvalError::div_zero();
            assert_eq!(err.code, codes::DIV_ZERO);
        }

        #[test]
        fn test_error_with_context() {
            let err = EvalError::undefined_var("y")
                .with_expression("y + 1")
                .at(0);
            let ctx = err.context.unwrap();
            assert_eq!(ctx.expression, Some("y + 1".to_string()));
            assert_eq!(ctx.position, Some(0));
        }

        #[test]
        fn test_from_number_error() {
            let err: EvalError = NumberError::Overflow.into();
            assert_eq!(err.code, codes::OVERFLOW);
            let err: EvalError = NumberError::DomainError("sqrt".into()).into();
            assert_eq!(err.code, codes::DOMAIN_ERROR);
        }

        #[test]
        fn test_error_display() {
            let err = EvalError::parse_error("unexpected token");
            let display = format!("{}", err);
            assert!(display.contains("PARSE_ERROR"));
            assert!(display.contains("suggestion"));
        }
    }
}
