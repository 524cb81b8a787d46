//! Display-length estimation for cell values.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::spec::EnumCellValue;

/// Number of characters `value` occupies once rendered, measured on its widest line.
///
/// Floats are rendered through [`render_display_text`] first.
pub fn display_length(value: &EnumCellValue, decimals: u32) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => display_length_text(s),
        other => display_length_text(&render_display_text(other, decimals)),
    }
}

/// Character count of the longest `\n`-separated line.
pub fn display_length_text(text: &str) -> usize {
    text.split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
}

/// Render a value as text, rounding floats to `decimals` places.
///
/// Floats go through an exact decimal conversion, half-even rounding and
/// trailing-zero normalization, then print in decimal scientific-string form:
/// `3.14159` renders as `3.142`, `2.5000` as `2.5` and `1500.0` as `1.5E+3`.
pub fn render_display_text(value: &EnumCellValue, decimals: u32) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
        EnumCellValue::Integer(n) => n.to_string(),
        EnumCellValue::Float(x) => render_float_text(*x, decimals),
    }
}

fn render_float_text(x: f64, decimals: u32) -> String {
    // NaN, infinities and magnitudes beyond 96-bit decimals keep the float form.
    match Decimal::from_f64_retain(x) {
        Some(d) => {
            let d = d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
            render_normalized_decimal(x.is_sign_negative(), d)
        }
        None => x.to_string(),
    }
}

/// Strip trailing zeros into the exponent, then print plain when the exponent
/// is `<= 0` and the adjusted exponent is `>= -6`, scientific otherwise.
fn render_normalized_decimal(if_negative: bool, d: Decimal) -> String {
    let mut c_digits = d.mantissa().unsigned_abs().to_string();
    let mut n_exp = -i64::from(d.scale());
    if d.is_zero() {
        c_digits = "0".to_string();
        n_exp = 0;
    } else {
        while c_digits.len() > 1 && c_digits.ends_with('0') {
            c_digits.pop();
            n_exp += 1;
        }
    }

    let n_digits = c_digits.len() as i64;
    let n_exp_adjusted = n_exp + n_digits - 1;
    let c_body = if n_exp <= 0 && n_exp_adjusted >= -6 {
        let n_frac = (-n_exp) as usize;
        if n_frac == 0 {
            c_digits
        } else if n_frac < c_digits.len() {
            let (c_int, c_frac) = c_digits.split_at(c_digits.len() - n_frac);
            format!("{c_int}.{c_frac}")
        } else {
            format!("0.{}{c_digits}", "0".repeat(n_frac - c_digits.len()))
        }
    } else {
        let (c_lead, c_rest) = c_digits.split_at(1);
        let c_sign_exp = if n_exp_adjusted < 0 { '-' } else { '+' };
        if c_rest.is_empty() {
            format!("{c_lead}E{c_sign_exp}{}", n_exp_adjusted.abs())
        } else {
            format!("{c_lead}.{c_rest}E{c_sign_exp}{}", n_exp_adjusted.abs())
        }
    };

    if if_negative { format!("-{c_body}") } else { c_body }
}
