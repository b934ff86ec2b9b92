//! Browser-like value handling for the fake page's form controls.

use crate::driver::StepDirection;

/// Options of a letter-grade select, in document order
pub const LETTER_GRADES: [&str; 13] = [
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "D-", "F",
];

/// `min` of the calculator's number inputs
pub const MIN_VALUE: f64 = 0.0;

/// `max` of the calculator's number inputs
pub const MAX_VALUE: f64 = 100.0;

/// Value a number input keeps after `text` was typed into it
///
/// Non-numeric text is rejected (`None`); numbers are clamped to the input's
/// range. Empty text is accepted as empty.
#[must_use]
pub fn sanitize_number(text: &str) -> Option<String> {
    let number = typed_number(text)?;
    Some(number.map_or_else(String::new, |n| {
        format_number(n.clamp(MIN_VALUE, MAX_VALUE))
    }))
}

/// Like [`sanitize_number`], but out-of-range numbers are kept as typed
#[must_use]
pub fn unclamped_number(text: &str) -> Option<String> {
    let number = typed_number(text)?;
    Some(number.map_or_else(String::new, format_number))
}

/// `Some(None)` for empty text, `None` for text that is not a finite number
fn typed_number(text: &str) -> Option<Option<f64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite()).map(Some)
}

/// Value after one `stepUp()`/`stepDown()`; empty or unparsable counts as 0
#[must_use]
pub fn stepped(value: &str, direction: StepDirection) -> String {
    let current = value.trim().parse::<f64>().unwrap_or(0.0);
    let next = match direction {
        StepDirection::Up => current.floor() + 1.0,
        StepDirection::Down => current.ceil() - 1.0,
    };
    format_number(next.clamp(MIN_VALUE, MAX_VALUE))
}

/// Option picked by typing `text` into a letter select
///
/// An exact (case-insensitive) match wins; otherwise the first option the
/// text is a prefix of.
#[must_use]
pub fn choose_letter(text: &str) -> Option<&'static str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    LETTER_GRADES
        .iter()
        .find(|option| option.eq_ignore_ascii_case(text))
        .or_else(|| {
            LETTER_GRADES
                .iter()
                .find(|option| option.to_ascii_lowercase().starts_with(&text.to_ascii_lowercase()))
        })
        .copied()
}

// -0.0 would render as "-0"
fn format_number(number: f64) -> String {
    format!("{}", number + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_number() {
        assert_eq!(sanitize_number("90").as_deref(), Some("90"));
        assert_eq!(sanitize_number("-10").as_deref(), Some("0"));
        assert_eq!(sanitize_number("150").as_deref(), Some("100"));
        assert_eq!(sanitize_number("12.5").as_deref(), Some("12.5"));
        assert_eq!(sanitize_number("-0").as_deref(), Some("0"));
        assert_eq!(sanitize_number("").as_deref(), Some(""));
        assert_eq!(sanitize_number("abc"), None);
        assert_eq!(sanitize_number("!@#"), None);
        assert_eq!(sanitize_number("inf"), None);
    }

    #[test]
    fn test_unclamped_number_keeps_range_violations() {
        assert_eq!(unclamped_number("-10").as_deref(), Some("-10"));
        assert_eq!(unclamped_number("150").as_deref(), Some("150"));
        assert_eq!(unclamped_number("90").as_deref(), Some("90"));
        assert_eq!(unclamped_number("").as_deref(), Some(""));
        assert_eq!(unclamped_number("abc"), None);
    }

    #[test]
    fn test_stepped() {
        assert_eq!(stepped("50", StepDirection::Up), "51");
        assert_eq!(stepped("51", StepDirection::Down), "50");
        assert_eq!(stepped("100", StepDirection::Up), "100");
        assert_eq!(stepped("0", StepDirection::Down), "0");
        assert_eq!(stepped("", StepDirection::Up), "1");
        assert_eq!(stepped("12.5", StepDirection::Up), "13");
        assert_eq!(stepped("12.5", StepDirection::Down), "12");
    }

    #[test]
    fn test_choose_letter() {
        assert_eq!(choose_letter("A"), Some("A"));
        assert_eq!(choose_letter("b+"), Some("B+"));
        assert_eq!(choose_letter("A-"), Some("A-"));
        assert_eq!(choose_letter("Invalid Grade"), None);
        assert_eq!(choose_letter(""), None);
    }

    proptest! {
        #[test]
        fn prop_steps_never_leave_range(
            start in 0u32..=100,
            ups in proptest::collection::vec(any::<bool>(), 0..300),
        ) {
            let mut value = start.to_string();
            let mut model = i64::from(start);
            for up in ups {
                let direction = if up { StepDirection::Up } else { StepDirection::Down };
                value = stepped(&value, direction);
                model = (model + if up { 1 } else { -1 }).clamp(0, 100);
                prop_assert_eq!(&value, &model.to_string());
            }
        }

        #[test]
        fn prop_typed_integers_are_clamped(n in -10_000i64..10_000) {
            let kept = sanitize_number(&n.to_string());
            prop_assert_eq!(kept, Some(n.clamp(0, 100).to_string()));
        }
    }
}
