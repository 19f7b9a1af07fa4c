//! Display formatting for formula results.

/// Format a number for display using round-trip general formatting.
///
/// 15 significant digits are tried first; when that text does not parse back
/// to the same double, 17 digits are used (`8.6000000000000014`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let short = format_general(n, 15);
    if short.parse::<f64>().ok() == Some(n) {
        short
    } else {
        format_general(n, 17)
    }
}

/// Read a cell's display value as a number for formula bindings.
/// Anything that is not a number (including empty text) reads as zero.
pub fn parse_number(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

fn format_general(n: f64, precision: usize) -> String {
    let sci = format!("{:.*e}", precision - 1, n);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');

    if exponent > -5 && exponent < precision as i32 {
        let mut out = String::from(sign);
        if exponent < 0 {
            out.push_str("0.");
            out.extend(std::iter::repeat_n('0', (-exponent - 1) as usize));
            out.push_str(digits);
        } else {
            let int_len = exponent as usize + 1;
            if digits.len() <= int_len {
                out.push_str(digits);
                out.extend(std::iter::repeat_n('0', int_len - digits.len()));
            } else {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            }
        }
        out
    } else {
        let (first, rest) = digits.split_at(1);
        let mut out = format!("{}{}", sign, first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("E{}{:02}", exp_sign, exponent.abs()));
        out
    }
}
