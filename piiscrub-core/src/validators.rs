// File: piiscrub-core/src/validators.rs
//! Programmatic validation functions for specific sensitive data types.
//!
//! These checks run after a regex match and remove false positives by applying
//! checksums and structural rules (Luhn, mod-97, Base58Check, SSA and HMRC
//! allocation rules). Recognizer rules reference them by name through [`lookup`].
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::collections::HashSet;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

/// Signature shared by every validator.
pub type ValidatorFn = fn(&str) -> bool;

/// Names accepted in a rule's `validator` field.
pub const KNOWN_VALIDATORS: &[&str] = &[
    "us_ssn",
    "uk_nino",
    "luhn",
    "iban",
    "ipv4",
    "ipv6",
    "btc_address",
    "email",
];

/// Resolves a validator by the name used in configuration files.
pub fn lookup(name: &str) -> Option<ValidatorFn> {
    let f: ValidatorFn = match name {
        "us_ssn" => is_valid_ssn_programmatically,
        "uk_nino" => is_valid_uk_nino_programmatically,
        "luhn" => is_valid_credit_card_programmatically,
        "iban" => is_valid_iban,
        "ipv4" => is_valid_ipv4,
        "ipv6" => is_valid_ipv6,
        "btc_address" => is_valid_btc_address,
        "email" => is_valid_email,
        _ => return None,
    };
    Some(f)
}

/// Validates a US SSN against Social Security Administration allocation rules.
///
/// Accepts `AAA-GG-SSSS`, `AAA GG SSSS` or nine bare digits. Area 000, 666
/// and 900-999, group 00 and serial 0000 are never issued. Numbers made of a
/// single repeated digit are rejected as placeholders.
pub fn is_valid_ssn_programmatically(ssn: &str) -> bool {
    let digits: String = ssn.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 9 || ssn.chars().any(|c| !(c.is_ascii_digit() || c == '-' || c == ' ')) {
        return false;
    }

    let first = digits.as_bytes()[0];
    if digits.bytes().all(|b| b == first) {
        return false;
    }

    let Some(area_num) = digits[0..3].parse::<u16>().ok() else { return false; };
    let Some(group_num) = digits[3..5].parse::<u8>().ok() else { return false; };
    let Some(serial_num) = digits[5..9].parse::<u16>().ok() else { return false; };

    let invalid_area = (area_num == 0) || (area_num == 666) || (area_num >= 900);
    let invalid_group = group_num == 0;
    let invalid_serial = serial_num == 0;

    !(invalid_area || invalid_group || invalid_serial)
}

static INVALID_NINO_PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["BF", "BG", "EH", "GB", "JE", "NK", "KN", "LI", "NT", "TN", "ZZ"]);
    set
});

static INVALID_NINO_PREFIX_CHARS: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(['D', 'F', 'I', 'Q', 'U', 'V', 'O']);
    set
});

static VALID_NINO_SUFFIX_CHARS: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(['A', 'B', 'C', 'D']);
    set
});

/// Validates a UK National Insurance Number (NINO) against HMRC rules.
///
/// Expected format "AA######A" with optional spaces between groups.
pub fn is_valid_uk_nino_programmatically(nino: &str) -> bool {
    const NINO_LENGTH: usize = 9;

    let nino_normalized: Cow<str> = if nino.chars().any(|c: char| c.is_ascii_lowercase()) {
        Cow::Owned(nino.to_uppercase())
    } else {
        Cow::Borrowed(nino)
    };

    let nino_no_spaces = nino_normalized.chars().filter(|c| !c.is_whitespace()).collect::<String>();

    if nino_no_spaces.len() != NINO_LENGTH || !nino_no_spaces.is_ascii() {
        return false;
    }

    let mut chars = nino_no_spaces.chars();

    let (Some(prefix_char1), Some(prefix_char2)) = (chars.next(), chars.next()) else { return false; };
    if !prefix_char1.is_ascii_alphabetic() || !prefix_char2.is_ascii_alphabetic() {
        return false;
    }

    let prefix_str = &nino_no_spaces[0..2];
    if INVALID_NINO_PREFIXES.contains(prefix_str) {
        return false;
    }
    if INVALID_NINO_PREFIX_CHARS.contains(&prefix_char1) || INVALID_NINO_PREFIX_CHARS.contains(&prefix_char2) {
        return false;
    }

    if !chars.by_ref().take(6).all(|c| c.is_ascii_digit()) {
        return false;
    }

    let Some(suffix_char) = chars.next() else { return false; };
    if !VALID_NINO_SUFFIX_CHARS.contains(&suffix_char) {
        return false;
    }

    chars.next().is_none()
}

/// Validates a digit string using the Luhn (mod 10) algorithm.
pub fn is_valid_luhn(num_str: &str) -> bool {
    let mut sum = 0;
    let mut alternate = false;

    for c in num_str.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Strips separators from a card number and checks its length (13-19 digits) and Luhn sum.
pub fn is_valid_credit_card_programmatically(cc_number: &str) -> bool {
    let digits: String = cc_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    is_valid_luhn(&digits)
}

/// Validates an IBAN with the ISO 13616 mod-97 check.
pub fn is_valid_iban(iban: &str) -> bool {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !(15..=34).contains(&compact.len()) || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    let (country, rest) = compact.split_at(2);
    if !country.chars().all(|c| c.is_ascii_alphabetic()) || !rest[..2].chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let rearranged = compact[4..].chars().chain(compact[..4].chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        remainder = match c.to_digit(10) {
            Some(d) => (remainder * 10 + d) % 97,
            None => (remainder * 100 + (c as u32 - 'A' as u32 + 10)) % 97,
        };
    }
    remainder == 1
}

/// Four dot-separated decimal octets, each at most 255, without leading zeros.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let octets: Vec<&str> = ip.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|o| {
            !o.is_empty()
                && o.len() <= 3
                && o.chars().all(|c| c.is_ascii_digit())
                && !(o.len() > 1 && o.starts_with('0'))
                && o.parse::<u16>().map_or(false, |v| v <= 255)
        })
}

pub fn is_valid_ipv6(ip: &str) -> bool {
    ip.parse::<std::net::Ipv6Addr>().is_ok()
}

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn base58_decode(s: &str) -> Option<Vec<u8>> {
    // Little-endian accumulator, reversed at the end.
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes() {
        let mut carry = BASE58_ALPHABET.iter().position(|&a| a == c)? as u32;
        for b in bytes.iter_mut() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    bytes.extend(s.bytes().take_while(|&c| c == b'1').map(|_| 0u8));
    bytes.reverse();
    Some(bytes)
}

/// Validates a Bitcoin address.
///
/// Legacy (`1...`/`3...`) addresses must pass Base58Check: the last four
/// bytes equal the first four of the double SHA-256 of the payload.
/// Bech32 (`bc1...`) addresses are checked for charset and length only.
pub fn is_valid_btc_address(address: &str) -> bool {
    if let Some(data) = address.strip_prefix("bc1") {
        return (39..=59).contains(&data.len()) && data.chars().all(|c| BECH32_CHARSET.contains(c));
    }

    let Some(decoded) = base58_decode(address) else { return false; };
    if decoded.len() != 25 {
        return false;
    }
    let (payload, checksum) = decoded.split_at(21);
    let digest = Sha256::digest(Sha256::digest(payload));
    &digest[..4] == checksum
}

/// A local part, an `@`, and a dotted domain ending in an alphabetic TLD of two or more letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else { return false; };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    labels
        .last()
        .map_or(false, |tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}
