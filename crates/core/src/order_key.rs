//! Order keys: sortable string tokens that admit a new key between any two.
//!
//! Slots in a lineup are ordered by an opaque [`SortKey`] rather than an integer
//! index. Moving a slot only rewrites that slot's key, never its neighbours.
//!
//! ## Format
//!
//! Keys use base-62 digits (`0-9A-Za-z`), whose ASCII order equals digit order, so
//! plain byte comparison is the ordering relation everywhere.
//!
//! A key is an *integer part* followed by an optional *fraction*:
//!
//! - the integer head encodes the integer length: `a`..`z` → 2..27 bytes,
//!   `A`..`Z` → 27..2 bytes (smaller heads sort first and hold smaller values);
//! - the fraction never ends in `0`, so there is always room below it.
//!
//! `"a0"` is the first key ever issued. Appending increments the integer part
//! (`a0`, `a1`, .., `az`, `b00`), which keeps keys short for the common
//! "add to the end" case. Inserting between adjacent keys grows the fraction.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ZERO: u8 = b'0';
const MAX_DIGIT: u8 = b'z';

/// `A` followed by 26 zeros: the smallest integer part, reserved so that every
/// issued key has room below it.
const SMALLEST_INTEGER: &[u8] = b"A00000000000000000000000000";

/// Opaque, totally-ordered position token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(String);

impl SortKey {
    /// Validate a key read from storage or supplied by a caller.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        validate_key(raw.as_bytes())?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn from_bytes(bytes: Vec<u8>) -> DomainResult<Self> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|e| DomainError::invalid_key(e.to_string()))
    }
}

impl ValueObject for SortKey {}

impl core::fmt::Display for SortKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SortKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generate a key strictly between `lower` and `upper`.
///
/// `None` means "no bound on this side". With both bounds absent the first key
/// (`"a0"`) is returned.
///
/// Errors:
/// - [`DomainError::InvalidOrderBounds`] if `lower >= upper`;
/// - [`DomainError::InvalidOrderKey`] if either bound is malformed;
/// - [`DomainError::OrderKeyExhausted`] if no key fits (unreachable for valid bounds).
pub fn key_between(lower: Option<&SortKey>, upper: Option<&SortKey>) -> DomainResult<SortKey> {
    if let (Some(a), Some(b)) = (lower, upper) {
        if a >= b {
            return Err(DomainError::invalid_bounds(format!(
                "lower bound '{a}' is not below upper bound '{b}'"
            )));
        }
    }

    let a = lower.map(|k| k.as_str().as_bytes());
    let b = upper.map(|k| k.as_str().as_bytes());
    if let Some(a) = a {
        validate_key(a)?;
    }
    if let Some(b) = b {
        validate_key(b)?;
    }

    let key = match (a, b) {
        (None, None) => vec![b'a', ZERO],
        (None, Some(b)) => {
            let (int_b, frac_b) = split_key(b)?;
            if int_b == SMALLEST_INTEGER {
                concat(int_b, &midpoint(&[], Some(frac_b))?)
            } else if !frac_b.is_empty() {
                int_b.to_vec()
            } else {
                let below = decrement_integer(int_b)?.ok_or_else(|| {
                    DomainError::exhausted(format!("no key below '{}'", String::from_utf8_lossy(b)))
                })?;
                if below == SMALLEST_INTEGER {
                    concat(&below, &midpoint(&[], None)?)
                } else {
                    below
                }
            }
        }
        (Some(a), None) => {
            let (int_a, frac_a) = split_key(a)?;
            match increment_integer(int_a)? {
                Some(next) => next,
                None => concat(int_a, &midpoint(frac_a, None)?),
            }
        }
        (Some(a), Some(b)) => {
            let (int_a, frac_a) = split_key(a)?;
            let (int_b, frac_b) = split_key(b)?;
            if int_a == int_b {
                concat(int_a, &midpoint(frac_a, Some(frac_b))?)
            } else {
                let next = increment_integer(int_a)?.ok_or_else(|| {
                    DomainError::exhausted(format!("no key above '{}'", String::from_utf8_lossy(a)))
                })?;
                if next.as_slice() < b {
                    next
                } else {
                    concat(int_a, &midpoint(frac_a, None)?)
                }
            }
        }
    };

    SortKey::from_bytes(key)
}

fn concat(head: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(head.len() + tail.len());
    out.extend_from_slice(head);
    out.extend_from_slice(tail);
    out
}

fn digit_value(c: u8) -> DomainResult<usize> {
    match c {
        b'0'..=b'9' => Ok(usize::from(c - b'0')),
        b'A'..=b'Z' => Ok(usize::from(c - b'A') + 10),
        b'a'..=b'z' => Ok(usize::from(c - b'a') + 36),
        _ => Err(DomainError::invalid_key(format!(
            "'{}' is not a base-62 digit",
            char::from(c)
        ))),
    }
}

fn integer_length(head: u8) -> DomainResult<usize> {
    match head {
        b'a'..=b'z' => Ok(usize::from(head - b'a') + 2),
        b'A'..=b'Z' => Ok(usize::from(b'Z' - head) + 2),
        _ => Err(DomainError::invalid_key(format!(
            "invalid integer head '{}'",
            char::from(head)
        ))),
    }
}

/// Split a key into its integer part and fraction.
fn split_key(key: &[u8]) -> DomainResult<(&[u8], &[u8])> {
    let head = *key
        .first()
        .ok_or_else(|| DomainError::invalid_key("empty key"))?;
    let len = integer_length(head)?;
    if len > key.len() {
        return Err(DomainError::invalid_key(format!(
            "integer part of '{}' is truncated",
            String::from_utf8_lossy(key)
        )));
    }
    Ok(key.split_at(len))
}

fn validate_key(key: &[u8]) -> DomainResult<()> {
    if key == SMALLEST_INTEGER {
        return Err(DomainError::invalid_key("the smallest integer key is reserved"));
    }
    let (int, frac) = split_key(key)?;
    for &c in int[1..].iter().chain(frac) {
        digit_value(c)?;
    }
    if frac.last() == Some(&ZERO) {
        return Err(DomainError::invalid_key(format!(
            "'{}' has a trailing zero",
            String::from_utf8_lossy(key)
        )));
    }
    Ok(())
}

/// Midpoint of two fractions (`b = None` means "1.0").
fn midpoint(a: &[u8], b: Option<&[u8]>) -> DomainResult<Vec<u8>> {
    if let Some(b) = b {
        if a >= b {
            return Err(DomainError::invalid_bounds(format!(
                "fraction '{}' is not below '{}'",
                String::from_utf8_lossy(a),
                String::from_utf8_lossy(b)
            )));
        }
    }
    if a.last() == Some(&ZERO) || b.and_then(|b| b.last()) == Some(&ZERO) {
        return Err(DomainError::invalid_key("fraction has a trailing zero"));
    }

    if let Some(b) = b {
        // Shared prefix (with `a` padded by zeros) is copied verbatim.
        let n = b
            .iter()
            .enumerate()
            .take_while(|&(i, &c)| a.get(i).copied().unwrap_or(ZERO) == c)
            .count();
        if n > 0 {
            let rest = midpoint(a.get(n..).unwrap_or(&[]), Some(&b[n..]))?;
            return Ok(concat(&b[..n], &rest));
        }
    }

    let digit_a = match a.first() {
        Some(&c) => digit_value(c)?,
        None => 0,
    };
    let digit_b = match b {
        Some(b) => match b.first() {
            Some(&c) => digit_value(c)?,
            None => return Err(DomainError::invalid_bounds("empty upper fraction")),
        },
        None => DIGITS.len(),
    };

    if digit_b > digit_a + 1 {
        return Ok(vec![DIGITS[(digit_a + digit_b + 1) / 2]]);
    }

    // Adjacent digits: either truncate `b`, or extend `a` by one more digit.
    if let Some(b) = b {
        if b.len() > 1 {
            return Ok(vec![b[0]]);
        }
    }
    let rest = midpoint(a.get(1..).unwrap_or(&[]), None)?;
    Ok(concat(&[DIGITS[digit_a]], &rest))
}

fn increment_integer(int: &[u8]) -> DomainResult<Option<Vec<u8>>> {
    let (&head, digits) = int
        .split_first()
        .ok_or_else(|| DomainError::invalid_key("empty integer part"))?;
    let mut digits = digits.to_vec();

    let mut carry = true;
    for d in digits.iter_mut().rev() {
        let next = digit_value(*d)? + 1;
        if next == DIGITS.len() {
            *d = ZERO;
        } else {
            *d = DIGITS[next];
            carry = false;
            break;
        }
    }

    if !carry {
        return Ok(Some(concat(&[head], &digits)));
    }
    match head {
        b'Z' => Ok(Some(vec![b'a', ZERO])),
        b'z' => Ok(None),
        _ => {
            let next_head = head + 1;
            if next_head > b'a' {
                digits.push(ZERO);
            } else {
                digits.pop();
            }
            Ok(Some(concat(&[next_head], &digits)))
        }
    }
}

fn decrement_integer(int: &[u8]) -> DomainResult<Option<Vec<u8>>> {
    let (&head, digits) = int
        .split_first()
        .ok_or_else(|| DomainError::invalid_key("empty integer part"))?;
    let mut digits = digits.to_vec();

    let mut borrow = true;
    for d in digits.iter_mut().rev() {
        let value = digit_value(*d)?;
        if value == 0 {
            *d = MAX_DIGIT;
        } else {
            *d = DIGITS[value - 1];
            borrow = false;
            break;
        }
    }

    if !borrow {
        return Ok(Some(concat(&[head], &digits)));
    }
    match head {
        b'a' => Ok(Some(vec![b'Z', MAX_DIGIT])),
        b'A' => Ok(None),
        _ => {
            let prev_head = head - 1;
            if prev_head < b'Z' {
                digits.push(MAX_DIGIT);
            } else {
                digits.pop();
            }
            Ok(Some(concat(&[prev_head], &digits)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(raw: &str) -> SortKey {
        SortKey::parse(raw).unwrap()
    }

    fn between(lower: Option<&str>, upper: Option<&str>) -> String {
        let lower = lower.map(key);
        let upper = upper.map(key);
        key_between(lower.as_ref(), upper.as_ref())
            .unwrap()
            .into_string()
    }

    #[test]
    fn first_key_is_a0() {
        assert_eq!(between(None, None), "a0");
    }

    #[test]
    fn appending_increments_the_integer_part() {
        assert_eq!(between(Some("a0"), None), "a1");
        assert_eq!(between(Some("a9"), None), "aA");
        assert_eq!(between(Some("az"), None), "b00");
        assert_eq!(between(Some("Zz"), None), "a0");
    }

    #[test]
    fn prepending_decrements_the_integer_part() {
        assert_eq!(between(None, Some("a0")), "Zz");
        assert_eq!(between(None, Some("b00")), "az");
        assert_eq!(between(None, Some("a0V")), "a0");
    }

    #[test]
    fn adjacent_keys_grow_a_fraction() {
        assert_eq!(between(Some("a0"), Some("a1")), "a0V");
        assert_eq!(between(Some("a0"), Some("a0V")), "a0G");
        assert_eq!(between(Some("a0V"), Some("a1")), "a0l");
    }

    #[test]
    fn equal_bounds_are_rejected() {
        let k = key("a1");
        let err = key_between(Some(&k), Some(&k)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOrderBounds(_)));
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let err = key_between(Some(&key("a2")), Some(&key("a1"))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOrderBounds(_)));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for raw in ["", "a", "a00", "!0", "b0", "A00000000000000000000000000", "a0-"] {
            assert!(
                matches!(SortKey::parse(raw), Err(DomainError::InvalidOrderKey(_))),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn largest_integer_falls_back_to_a_fraction() {
        let top = format!("z{}", "z".repeat(26));
        let next = between(Some(&top), None);
        assert!(next.as_str() > top.as_str());
        assert!(next.starts_with(&top));
    }

    #[test]
    fn smallest_integer_falls_back_to_a_fraction() {
        let bottom = format!("A{}1", "0".repeat(26));
        let below = between(None, Some(&bottom));
        assert!(below.as_str() < bottom.as_str());
        SortKey::parse(&below).unwrap();
    }

    #[test]
    fn repeated_bisection_towards_the_lower_bound_never_runs_out() {
        let lower = key("a0");
        let mut upper = key("a1");
        for _ in 0..500 {
            let mid = key_between(Some(&lower), Some(&upper)).unwrap();
            assert!(lower < mid && mid < upper);
            upper = mid;
        }
    }

    /// Keys over the whole integer range: `a`..`z` heads come from appends,
    /// `A`..`Z` heads from repeated prepends.
    fn valid_key() -> impl Strategy<Value = SortKey> {
        (
            prop_oneof![b'a'..=b'z', b'A'..=b'Z'],
            prop::collection::vec(0usize..62, 26),
            prop::collection::vec(0usize..62, 0..6),
        )
            .prop_filter_map("reserved smallest integer", |(head, int_digits, mut frac)| {
                let len = integer_length(head).ok()?;
                let mut raw = vec![head];
                raw.extend(int_digits.iter().take(len - 1).map(|&d| DIGITS[d]));
                while frac.last() == Some(&0) {
                    frac.pop();
                }
                raw.extend(frac.iter().map(|&d| DIGITS[d]));
                SortKey::parse(std::str::from_utf8(&raw).ok()?).ok()
            })
    }

    #[test]
    fn repeated_prepends_walk_into_uppercase_heads() {
        let mut first = key("a0");
        for _ in 0..200 {
            let below = key_between(None, Some(&first)).unwrap();
            assert!(below < first);
            first = below;
        }
        assert!(first.as_str().starts_with('Y'));

        let next = key_between(Some(&first), Some(&key("a0"))).unwrap();
        assert!(first < next && next < key("a0"));
    }

    #[test]
    fn prepend_never_issues_the_reserved_integer() {
        let bottom = format!("A{}1", "0".repeat(25));
        let below = between(None, Some(&bottom));
        assert!(below.as_str() < bottom.as_str());
        SortKey::parse(&below).unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any two distinct keys admit a key strictly between them.
        #[test]
        fn key_between_distinct_keys_is_strictly_between(a in valid_key(), b in valid_key()) {
            prop_assume!(a != b);
            let (lower, upper) = if a < b { (a, b) } else { (b, a) };
            let mid = key_between(Some(&lower), Some(&upper)).unwrap();
            prop_assert!(lower < mid, "{} !< {}", lower, mid);
            prop_assert!(mid < upper, "{} !< {}", mid, upper);
        }

        /// Property: open-ended bounds move strictly away from the given key.
        #[test]
        fn open_bounds_move_away_from_the_given_key(k in valid_key()) {
            let above = key_between(Some(&k), None).unwrap();
            let below = key_between(None, Some(&k)).unwrap();
            prop_assert!(above > k);
            prop_assert!(below < k);
        }

        /// Property: arbitrary insertion sequences keep the list strictly sorted.
        #[test]
        fn random_insertions_keep_keys_sorted(
            picks in prop::collection::vec(any::<prop::sample::Index>(), 1..200)
        ) {
            let mut keys: Vec<SortKey> = Vec::new();
            for pick in picks {
                let pos = pick.index(keys.len() + 1);
                let lower = pos.checked_sub(1).map(|i| &keys[i]);
                let upper = keys.get(pos);
                let k = key_between(lower, upper).unwrap();
                if let Some(l) = lower {
                    prop_assert!(l < &k);
                }
                if let Some(u) = upper {
                    prop_assert!(&k < u);
                }
                keys.insert(pos, k);
            }
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
