//! Float helper routines shared with the bytecode consumer.
//!
//! Backends that cannot express wasm's NaN and signed-zero rules with a
//! single native opcode call these instead. The rules:
//!
//! * `min(+0, -0) = -0`, `max(+0, -0) = +0`,
//! * a NaN in either operand produces the canonical quiet NaN,
//! * `floor`/`ceil`/`trunc`/`nearest` map NaN to the canonical quiet NaN
//!   and otherwise round as named (`nearest` is round-to-nearest,
//!   ties-to-even).

macro_rules! float_helpers {
    ($ty:ident, $min:ident, $max:ident, $floor:ident, $ceil:ident, $trunc:ident, $nearest:ident, $sqrt:ident, $copysign:ident) => {
        pub fn $min(lhs: $ty, rhs: $ty) -> $ty {
            if lhs.is_nan() || rhs.is_nan() {
                return $ty::NAN;
            }
            if lhs == 0.0 && rhs == 0.0 {
                return if lhs.is_sign_negative() { lhs } else { rhs };
            }
            lhs.min(rhs)
        }

        pub fn $max(lhs: $ty, rhs: $ty) -> $ty {
            if lhs.is_nan() || rhs.is_nan() {
                return $ty::NAN;
            }
            if lhs == 0.0 && rhs == 0.0 {
                return if lhs.is_sign_negative() { rhs } else { lhs };
            }
            lhs.max(rhs)
        }

        pub fn $floor(operand: $ty) -> $ty {
            if operand.is_nan() {
                return $ty::NAN;
            }
            operand.floor()
        }

        pub fn $ceil(operand: $ty) -> $ty {
            if operand.is_nan() {
                return $ty::NAN;
            }
            operand.ceil()
        }

        pub fn $trunc(operand: $ty) -> $ty {
            if operand.is_nan() {
                return $ty::NAN;
            }
            operand.trunc()
        }

        pub fn $nearest(operand: $ty) -> $ty {
            if operand.is_nan() {
                return $ty::NAN;
            }
            operand.round_ties_even()
        }

        pub fn $sqrt(operand: $ty) -> $ty {
            let result = operand.sqrt();
            if result.is_nan() {
                return $ty::NAN;
            }
            result
        }

        pub fn $copysign(lhs: $ty, rhs: $ty) -> $ty {
            lhs.copysign(rhs)
        }
    };
}

float_helpers!(f32, min_f32, max_f32, floor_f32, ceil_f32, trunc_f32, nearest_f32, sqrt_f32, copysign_f32);
float_helpers!(f64, min_f64, max_f64, floor_f64, ceil_f64, trunc_f64, nearest_f64, sqrt_f64, copysign_f64);

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL_NAN_F32: u32 = 0x7fc0_0000;
    const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

    #[test]
    fn min_signed_zeros() {
        assert!(min_f32(-0.0, 0.0).is_sign_negative());
        assert!(min_f32(0.0, -0.0).is_sign_negative());
        assert!(min_f64(-0.0, 0.0).is_sign_negative());
    }

    #[test]
    fn max_signed_zeros() {
        assert!(!max_f32(-0.0, 0.0).is_sign_negative());
        assert!(!max_f32(0.0, -0.0).is_sign_negative());
        assert!(!max_f64(0.0, -0.0).is_sign_negative());
    }

    #[test]
    fn min_max_canonicalize_nan() {
        // A NaN with a payload must come out as the canonical quiet NaN.
        let payload_nan = f32::from_bits(0x7f80_0001 | 0x0040_0000 | 0x1234);
        assert_eq!(min_f32(payload_nan, 1.0).to_bits(), CANONICAL_NAN_F32);
        assert_eq!(max_f32(1.0, payload_nan).to_bits(), CANONICAL_NAN_F32);
        assert_eq!(min_f64(f64::NAN, 1.0).to_bits(), CANONICAL_NAN_F64);
    }

    #[test]
    fn min_max_ordinary_values() {
        assert_eq!(min_f32(1.0, 2.0), 1.0);
        assert_eq!(max_f32(1.0, 2.0), 2.0);
        assert_eq!(min_f64(-3.5, -3.25), -3.5);
        assert_eq!(max_f64(-3.5, -3.25), -3.25);
    }

    #[test]
    fn rounding_nan_in_nan_out() {
        assert_eq!(floor_f32(f32::NAN).to_bits(), CANONICAL_NAN_F32);
        assert_eq!(ceil_f64(f64::NAN).to_bits(), CANONICAL_NAN_F64);
        assert_eq!(trunc_f32(f32::NAN).to_bits(), CANONICAL_NAN_F32);
        assert_eq!(nearest_f64(f64::NAN).to_bits(), CANONICAL_NAN_F64);
    }

    #[test]
    fn nearest_rounds_ties_to_even() {
        assert_eq!(nearest_f32(0.5), 0.0);
        assert_eq!(nearest_f32(1.5), 2.0);
        assert_eq!(nearest_f32(2.5), 2.0);
        assert_eq!(nearest_f64(-0.5), -0.0);
        assert_eq!(nearest_f64(-1.5), -2.0);
    }

    #[test]
    fn rounding_ordinary_values() {
        assert_eq!(floor_f32(1.7), 1.0);
        assert_eq!(ceil_f32(1.2), 2.0);
        assert_eq!(trunc_f64(-1.7), -1.0);
        assert_eq!(sqrt_f64(9.0), 3.0);
    }

    #[test]
    fn sqrt_of_negative_is_canonical_nan() {
        assert_eq!(sqrt_f32(-1.0).to_bits(), CANONICAL_NAN_F32);
        assert_eq!(sqrt_f64(-1.0).to_bits(), CANONICAL_NAN_F64);
    }

    #[test]
    fn copysign_transfers_sign_only() {
        assert_eq!(copysign_f32(1.5, -2.0), -1.5);
        assert_eq!(copysign_f64(-1.5, 2.0), 1.5);
    }
}
