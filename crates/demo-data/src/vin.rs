//! North American VIN check digits (position 9, ISO 3779 alphabet).

/// Characters allowed in a VIN: digits and letters except I, O and Q.
pub(crate) const VIN_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKLMNPRSTUVWXYZ";

const WEIGHTS: [u32; 17] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

fn transliterate(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some(u32::from(c - b'0')),
        b'A' | b'J' => Some(1),
        b'B' | b'K' | b'S' => Some(2),
        b'C' | b'L' | b'T' => Some(3),
        b'D' | b'M' | b'U' => Some(4),
        b'E' | b'N' | b'V' => Some(5),
        b'F' | b'W' => Some(6),
        b'G' | b'P' | b'X' => Some(7),
        b'H' | b'Y' => Some(8),
        b'R' | b'Z' => Some(9),
        _ => None,
    }
}

/// Compute the check digit for a 17 character VIN.
///
/// Position 9 is weighted zero, so its current value does not matter.
/// Returns `None` when the input has the wrong length or a character
/// outside the VIN alphabet.
///
/// # Examples
///
/// ```
/// use demo_data::vin_check_digit;
///
/// assert_eq!(vin_check_digit("1HGCM82633A004352"), Some('3'));
/// assert_eq!(vin_check_digit("1M8GDM9A_KP042788"), None);
/// ```
#[must_use]
pub fn vin_check_digit(vin: &str) -> Option<char> {
    let bytes = vin.as_bytes();
    if bytes.len() != WEIGHTS.len() {
        return None;
    }
    let mut sum = 0_u32;
    for (&c, weight) in bytes.iter().zip(WEIGHTS) {
        sum += transliterate(c)? * weight;
    }
    match sum.rem_euclid(11) {
        10 => Some('X'),
        digit => char::from_digit(digit, 10),
    }
}

/// Whether `vin` is well formed and carries the right check digit.
///
/// # Examples
///
/// ```
/// use demo_data::is_valid_vin;
///
/// assert!(is_valid_vin("1M8GDM9AXKP042788"));
/// assert!(!is_valid_vin("5YJ3E1EA7KF317000"));
/// ```
#[must_use]
pub fn is_valid_vin(vin: &str) -> bool {
    vin.chars().nth(8).is_some_and(|c| vin_check_digit(vin) == Some(c))
}

/// Year code at position 10 for 2001 to 2030.
pub(crate) fn model_year_code(year: i32) -> Option<char> {
    const CODES: &[u8] = b"123456789ABCDEFGHJKLMNPRSTVWXY";
    let offset = usize::try_from(year.checked_sub(2001)?).ok()?;
    CODES.get(offset).map(|&c| char::from(c))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1HGCM82633A004352", true)]
    #[case("1M8GDM9AXKP042788", true)]
    #[case("5YJ3E1EA7KF317000", false)]
    #[case("1HGCM82633A00435", false)]
    #[case("1HGCM82633A00435I", false)]
    fn validates_check_digits(#[case] vin: &str, #[case] expected: bool) {
        assert_eq!(is_valid_vin(vin), expected);
    }

    #[rstest]
    #[case(2001, Some('1'))]
    #[case(2010, Some('A'))]
    #[case(2019, Some('K'))]
    #[case(2024, Some('R'))]
    #[case(1999, None)]
    fn year_codes_skip_ambiguous_letters(#[case] year: i32, #[case] expected: Option<char>) {
        assert_eq!(model_year_code(year), expected);
    }
}
