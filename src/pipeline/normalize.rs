//! Per-field value normalization applied between column mapping and
//! validation. All rules trim first; an input that is (or becomes) empty
//! normalizes to an explicit absent value, never an empty string.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeRule {
    Trim,
    Lower,
    Upper,
    DigitsOnly,
    Email,
    Phone,
}

/// Characters stripped by the phone rule: whitespace (including the
/// ideographic space via char::is_whitespace), ASCII and full-width
/// parentheses, and the hyphen variants that show up in pasted phone data.
fn is_phone_noise(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '-' | '(' | ')' | '（' | '）' | '－' | 'ー' | '−' | '‐' | '‒' | '–' | '—' | '―'
        )
}

/// Applies one normalization rule. Pure and idempotent: running a rule twice
/// yields the same value as once.
pub fn normalize(value: Option<&str>, rule: NormalizeRule) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let out = match rule {
        NormalizeRule::Trim => trimmed.to_string(),
        NormalizeRule::Lower | NormalizeRule::Email => trimmed.to_lowercase(),
        NormalizeRule::Upper => trimmed.to_uppercase(),
        NormalizeRule::DigitsOnly => trimmed.chars().filter(char::is_ascii_digit).collect(),
        NormalizeRule::Phone => trimmed.chars().filter(|c| !is_phone_noise(*c)).collect(),
    };

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Which rule the decision pipeline applies to each mapped field. Email and
/// phone double as exact-match dedup keys, so they get their dedicated rules;
/// everything else is trimmed as-is.
pub fn rule_for_field(field: &str) -> NormalizeRule {
    match field {
        "email" => NormalizeRule::Email,
        "phone" => NormalizeRule::Phone,
        _ => NormalizeRule::Trim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_strips_surrounding_whitespace() {
        assert_eq!(
            normalize(Some("  Jon Smith \t"), NormalizeRule::Trim),
            Some("Jon Smith".to_string())
        );
    }

    #[test]
    fn case_fold_rules() {
        assert_eq!(
            normalize(Some(" MiXeD "), NormalizeRule::Lower),
            Some("mixed".to_string())
        );
        assert_eq!(
            normalize(Some("wa"), NormalizeRule::Upper),
            Some("WA".to_string())
        );
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(
            normalize(Some(" Jon.Smith@Example.COM "), NormalizeRule::Email),
            Some("jon.smith@example.com".to_string())
        );
    }

    #[test]
    fn digits_only_strips_everything_else() {
        assert_eq!(
            normalize(Some("98101-1234"), NormalizeRule::DigitsOnly),
            Some("981011234".to_string())
        );
        assert_eq!(normalize(Some("abc"), NormalizeRule::DigitsOnly), None);
    }

    #[test]
    fn phone_strips_separators_including_full_width() {
        assert_eq!(
            normalize(Some("(206) 555-0100"), NormalizeRule::Phone),
            Some("2065550100".to_string())
        );
        assert_eq!(
            normalize(Some("（０３）１２３４ー５６７８"), NormalizeRule::Phone),
            Some("０３１２３４５６７８".to_string())
        );
        assert_eq!(
            normalize(Some("090−1234−5678"), NormalizeRule::Phone),
            Some("09012345678".to_string())
        );
    }

    #[test]
    fn empty_and_none_normalize_to_absent() {
        for rule in [
            NormalizeRule::Trim,
            NormalizeRule::Lower,
            NormalizeRule::Email,
            NormalizeRule::Phone,
        ] {
            assert_eq!(normalize(None, rule), None);
            assert_eq!(normalize(Some(""), rule), None);
            assert_eq!(normalize(Some("   "), rule), None);
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let cases = [
            ("  Jon Smith ", NormalizeRule::Trim),
            ("Jon.Smith@Example.COM", NormalizeRule::Email),
            ("(206) 555-0100", NormalizeRule::Phone),
            ("98101-1234", NormalizeRule::DigitsOnly),
            ("MiXeD", NormalizeRule::Lower),
            ("mixed", NormalizeRule::Upper),
        ];
        for (input, rule) in cases {
            let once = normalize(Some(input), rule);
            let twice = normalize(once.as_deref(), rule);
            assert_eq!(once, twice, "rule {:?} not idempotent on {:?}", rule, input);
        }
    }

    #[test]
    fn field_rule_table() {
        assert_eq!(rule_for_field("email"), NormalizeRule::Email);
        assert_eq!(rule_for_field("phone"), NormalizeRule::Phone);
        assert_eq!(rule_for_field("full_name"), NormalizeRule::Trim);
        assert_eq!(rule_for_field("zip_code"), NormalizeRule::Trim);
    }
}
