//! Math function implementations
//!
//! Arity is enforced by the compiler before these are bound, so each
//! implementation may index its declared arguments directly.

/// sqrt(x); negative input yields NaN
pub fn fn_sqrt(args: &[f64]) -> f64 {
    args[0].sqrt()
}

/// abs(x)
pub fn fn_abs(args: &[f64]) -> f64 {
    args[0].abs()
}

/// sin(x), radians
pub fn fn_sin(args: &[f64]) -> f64 {
    args[0].sin()
}

/// cos(x), radians
pub fn fn_cos(args: &[f64]) -> f64 {
    args[0].cos()
}

/// tan(x), radians
pub fn fn_tan(args: &[f64]) -> f64 {
    args[0].tan()
}

/// asin(x); out of [-1, 1] yields NaN
pub fn fn_asin(args: &[f64]) -> f64 {
    args[0].asin()
}

/// acos(x); out of [-1, 1] yields NaN
pub fn fn_acos(args: &[f64]) -> f64 {
    args[0].acos()
}

/// atan(x)
pub fn fn_atan(args: &[f64]) -> f64 {
    args[0].atan()
}

/// exp(x)
pub fn fn_exp(args: &[f64]) -> f64 {
    args[0].exp()
}

/// ln(x), natural log; non-positive input yields NaN or -inf
pub fn fn_ln(args: &[f64]) -> f64 {
    args[0].ln()
}

/// log(x) base 10, or log(x, base)
pub fn fn_log(args: &[f64]) -> f64 {
    match args {
        [x] => x.log10(),
        [x, base] => x.log(*base),
        _ => f64::NAN,
    }
}

/// log10(x)
pub fn fn_log10(args: &[f64]) -> f64 {
    args[0].log10()
}

/// floor(x)
pub fn fn_floor(args: &[f64]) -> f64 {
    args[0].floor()
}

/// ceil(x)
pub fn fn_ceil(args: &[f64]) -> f64 {
    args[0].ceil()
}

/// round(x), half away from zero
pub fn fn_round(args: &[f64]) -> f64 {
    args[0].round()
}

/// sign(x): -1, 0 or 1; NaN stays NaN
pub fn fn_sign(args: &[f64]) -> f64 {
    let x = args[0];
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

/// min over all arguments
pub fn fn_min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, f64::min)
}

/// max over all arguments
pub fn fn_max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// pow(base, exponent)
pub fn fn_pow(args: &[f64]) -> f64 {
    args[0].powf(args[1])
}

/// atan2(y, x)
pub fn fn_atan2(args: &[f64]) -> f64 {
    args[0].atan2(args[1])
}

/// mod(a, b), floored: the result has the sign of the divisor
pub fn fn_mod(args: &[f64]) -> f64 {
    let (a, b) = (args[0], args[1]);
    a - b * (a / b).floor()
}

/// pi()
pub fn fn_pi(_args: &[f64]) -> f64 {
    std::f64::consts::PI
}

/// e()
pub fn fn_e(_args: &[f64]) -> f64 {
    std::f64::consts::E
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_forms() {
        assert_eq!(fn_log(&[100.0]), 2.0);
        assert_eq!(fn_log(&[8.0, 2.0]), 3.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(fn_sign(&[-3.5]), -1.0);
        assert_eq!(fn_sign(&[0.0]), 0.0);
        assert_eq!(fn_sign(&[7.0]), 1.0);
        assert!(fn_sign(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_min_max_variadic() {
        assert_eq!(fn_min(&[3.0, -1.0, 2.0]), -1.0);
        assert_eq!(fn_max(&[3.0, -1.0, 2.0]), 3.0);
    }

    #[test]
    fn test_mod_sign_follows_divisor() {
        assert_eq!(fn_mod(&[7.0, 3.0]), 1.0);
        assert_eq!(fn_mod(&[-7.0, 3.0]), 2.0);
        assert_eq!(fn_mod(&[7.0, -3.0]), -2.0);
    }

    #[test]
    fn test_domain_edges_follow_ieee() {
        assert!(fn_sqrt(&[-1.0]).is_nan());
        assert!(fn_asin(&[2.0]).is_nan());
        assert_eq!(fn_ln(&[0.0]), f64::NEG_INFINITY);
    }
}
