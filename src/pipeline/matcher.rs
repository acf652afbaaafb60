//! Duplicate detection: an exact-match fast path on the contact-info dedup
//! keys, then fuzzy name/address scoring against a caller-supplied snapshot
//! of the customer registry.

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Customer, FieldMap};
use crate::pipeline::similarity::{round2, similarity};

/// Matching policy constants. The blend applied to fuzzy scores:
/// name and address both similar -> `name_weight * name + address_weight * addr`;
/// address present but dissimilar -> `name * name_only_penalty`;
/// address missing on either side -> name score alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum combined score for a customer to be flagged as a candidate.
    pub threshold: f64,
    /// Result cap per row.
    pub max_candidates: usize,
    pub name_weight: f64,
    pub address_weight: f64,
    pub name_only_penalty: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            max_candidates: 5,
            name_weight: 0.5,
            address_weight: 0.5,
            name_only_penalty: 0.7,
        }
    }
}

/// One possible match against an existing customer.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub customer_id: Uuid,
    pub match_reason: String,
    /// Rounded to 2 decimals.
    pub score: f64,
}

/// Finds duplicate candidates for a normalized row against an immutable
/// registry snapshot. Precedence is strict: an exact email hit is the only
/// result and skips everything else; then an exact phone hit; only when
/// neither contact key matches does fuzzy name/address scoring run. Results
/// are sorted by descending score, ties keeping snapshot order, capped at
/// `config.max_candidates`.
pub fn find_candidates(
    row: &FieldMap,
    snapshot: &[Customer],
    config: &MatcherConfig,
) -> Vec<MatchCandidate> {
    if let Some(email) = row.get("email").filter(|v| !v.is_empty()) {
        for customer in snapshot {
            let Some(id) = customer.id else { continue };
            if customer.email.as_deref() == Some(email.as_str()) {
                return vec![MatchCandidate {
                    customer_id: id,
                    match_reason: format!("email exact match: {email}"),
                    score: 1.0,
                }];
            }
        }
    }

    if let Some(phone) = row.get("phone").filter(|v| !v.is_empty()) {
        for customer in snapshot {
            let Some(id) = customer.id else { continue };
            if customer.phone.as_deref() == Some(phone.as_str()) {
                return vec![MatchCandidate {
                    customer_id: id,
                    match_reason: format!("phone exact match: {phone}"),
                    score: 1.0,
                }];
            }
        }
    }

    let Some(name) = row.get("full_name").filter(|v| !v.is_empty()) else {
        return Vec::new();
    };
    let address = row.get("address").filter(|v| !v.is_empty());

    let mut candidates = Vec::new();
    for customer in snapshot {
        let Some(id) = customer.id else { continue };
        let Some(cust_name) = customer.full_name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };

        let name_score = similarity(name, cust_name);
        if name_score < config.threshold {
            continue;
        }

        let mut reason = format!("name similar: {cust_name} (score {name_score:.2})");
        let combined = match (address, customer.address.as_deref()) {
            (Some(addr), Some(cust_addr)) if !cust_addr.is_empty() => {
                let addr_score = similarity(addr, cust_addr);
                if addr_score >= config.threshold {
                    reason.push_str(&format!(
                        " / address similar: {cust_addr} (score {addr_score:.2})"
                    ));
                    config.name_weight * name_score + config.address_weight * addr_score
                } else {
                    name_score * config.name_only_penalty
                }
            }
            _ => name_score,
        };

        if combined >= config.threshold {
            candidates.push(MatchCandidate {
                customer_id: id,
                match_reason: reason,
                score: round2(combined),
            });
        }
    }

    // sort_by is stable, so equal scores keep snapshot order.
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(config.max_candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(name: &str, email: Option<&str>, phone: Option<&str>, address: Option<&str>) -> Customer {
        Customer {
            id: Some(Uuid::new_v4()),
            full_name: Some(name.to_string()),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            address: address.map(str::to_string),
            city: None,
            state: None,
            zip_code: None,
            created_at: Utc::now(),
        }
    }

    fn row(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn exact_email_is_the_only_result_and_skips_fuzzy() {
        let snapshot = vec![
            customer("Jon Smith", None, None, None), // would fuzzy-match on name
            customer("Somebody Else", Some("a@x.com"), None, None),
        ];
        let found = find_candidates(
            &row(&[("email", "a@x.com"), ("full_name", "Jon Smith")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_id, snapshot[1].id.unwrap());
        assert_eq!(found[0].score, 1.0);
        assert!(found[0].match_reason.contains("email exact match"));
    }

    #[test]
    fn exact_phone_short_circuits_when_no_email_hit() {
        let snapshot = vec![customer("P Holder", None, Some("2065550100"), None)];
        let found = find_candidates(
            &row(&[("email", "new@x.com"), ("phone", "2065550100")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert_eq!(found.len(), 1);
        assert!(found[0].match_reason.contains("phone exact match"));
    }

    #[test]
    fn no_usable_name_means_no_candidates() {
        let snapshot = vec![customer("Jon Smith", None, None, None)];
        let found = find_candidates(
            &row(&[("city", "Seattle")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn name_and_address_blend_half_and_half() {
        let snapshot = vec![customer(
            "John Smith",
            None,
            None,
            Some("12 Main Street"),
        )];
        let found = find_candidates(
            &row(&[("full_name", "Jon Smith"), ("address", "12 Main Street")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert_eq!(found.len(), 1);
        // name 0.9, address 1.0 -> 0.5*0.9 + 0.5*1.0 = 0.95
        assert_eq!(found[0].score, 0.95);
        assert!(found[0].match_reason.contains("name similar"));
        assert!(found[0].match_reason.contains("address similar"));
    }

    #[test]
    fn dissimilar_address_penalizes_below_threshold() {
        // name 0.9 but addresses disagree: 0.9 * 0.7 = 0.63 < 0.85, filtered.
        let snapshot = vec![customer(
            "John Smith",
            None,
            None,
            Some("999 Completely Different Blvd"),
        )];
        let found = find_candidates(
            &row(&[("full_name", "Jon Smith"), ("address", "12 Main Street")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn missing_address_falls_back_to_name_score() {
        let snapshot = vec![customer("John Smith", None, None, None)];
        let found = find_candidates(
            &row(&[("full_name", "Jon Smith")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 0.9);
    }

    #[test]
    fn results_sorted_descending_capped_at_five_ties_stable() {
        let exact = customer("Jon Smith", None, None, None);
        let mut snapshot = Vec::new();
        // Six identical-name customers plus one exact: cap kicks in.
        snapshot.push(customer("John Smith", None, None, None)); // 0.9
        for _ in 0..5 {
            snapshot.push(exact.clone_with_new_id());
        }
        let found = find_candidates(
            &row(&[("full_name", "Jon Smith")]),
            &snapshot,
            &MatcherConfig::default(),
        );
        assert_eq!(found.len(), 5);
        for pair in found.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // The five 1.0 ties keep snapshot order and displace the 0.9 entry.
        for (candidate, cust) in found.iter().zip(&snapshot[1..]) {
            assert_eq!(candidate.customer_id, cust.id.unwrap());
        }
    }

    impl Customer {
        fn clone_with_new_id(&self) -> Customer {
            let mut c = self.clone();
            c.id = Some(Uuid::new_v4());
            c
        }
    }
}
