//! ISBN canonicalisation to 13-digit form.

/// Normalises `raw` to an ISBN-13 digit string.
///
/// Only digits and `X`/`x` survive. A valid ISBN-10 is re-prefixed with
/// `978` and gets a fresh check digit; a valid ISBN-13 with a `978`/`979`
/// prefix is returned as is. Everything else is `None`.
pub fn to_isbn13(raw: &str) -> Option<String> {
    let canonical: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    match canonical.len() {
        10 if is_isbn10(&canonical) => {
            let mut isbn13 = String::with_capacity(13);
            isbn13.push_str("978");
            isbn13.push_str(&canonical[..9]);
            let check = isbn13_check_digit(&isbn13)?;
            isbn13.push(check);
            Some(isbn13)
        }
        13 if is_isbn13(&canonical) => Some(canonical),
        _ => None,
    }
}

/// Weighted mod-11 checksum; `X` (10) is only legal as the check digit.
pub fn is_isbn10(isbn: &str) -> bool {
    let bytes = isbn.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let mut sum = 0u32;
    for (position, &b) in bytes.iter().enumerate() {
        let value = match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'X' if position == 9 => 10,
            _ => return false,
        };
        sum += (10 - position as u32) * value;
    }
    sum % 11 == 0
}

/// `978`/`979` prefix and alternating 1/3 weighted mod-10 checksum.
pub fn is_isbn13(isbn: &str) -> bool {
    if isbn.len() != 13 || !isbn.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !(isbn.starts_with("978") || isbn.starts_with("979")) {
        return false;
    }
    weighted_sum(isbn.as_bytes()) % 10 == 0
}

/// Check digit completing a 12-digit ISBN-13 body.
fn isbn13_check_digit(body: &str) -> Option<char> {
    if body.len() != 12 || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let check = (10 - weighted_sum(body.as_bytes()) % 10) % 10;
    char::from_digit(check, 10)
}

fn weighted_sum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 { d } else { 3 * d }
        })
        .sum()
}
