//! Ordered first-match-wins rule lists for free-text categorical answers.

use crate::data::UNKNOWN;

/// Maps to `label` when the lower-cased answer contains any of `needles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub needles: Vec<String>,
    pub label: String,
}

impl Rule {
    pub fn new(needles: &[&str], label: &str) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_ascii_lowercase()).collect(),
            label: label.to_string(),
        }
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.needles.iter().any(|needle| lowered.contains(needle.as_str()))
    }
}

/// Rules are evaluated top to bottom; the first match decides the label.
/// Answers matching nothing get `fallback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    fallback: String,
}

impl RuleSet {
    pub fn new(rules: &[(&[&str], &str)], fallback: &str) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(needles, label)| Rule::new(needles, label))
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    pub fn classify<'a>(&'a self, raw: &str) -> &'a str {
        if raw == UNKNOWN {
            return UNKNOWN;
        }
        let lowered = raw.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

pub fn education_rules() -> RuleSet {
    RuleSet::new(
        &[
            (&["primary", "elementary"], "Primary"),
            (&["secondary", "high school"], "Secondary"),
            (&["some college"], "Some college"),
            (&["bachelor"], "Bachelor's"),
            (&["master"], "Master's"),
            (&["professional degree"], "Professional"),
            (&["doctoral", "phd"], "Doctorate"),
            (&["prefer not to"], UNKNOWN),
        ],
        "Other",
    )
}

pub const EDUCATION_LABELS: &[&str] = &[
    "Primary",
    "Secondary",
    "Some college",
    "Bachelor's",
    "Master's",
    "Professional",
    "Doctorate",
    "Other",
    UNKNOWN,
];

pub fn employment_rules() -> RuleSet {
    RuleSet::new(
        &[
            (&["full-time"], "Full-time"),
            (&["part-time"], "Part-time"),
            (
                &["contractor", "freelancer", "self-employed"],
                "Self-employed",
            ),
            (&["not employed"], "Unemployed"),
            (&["retired"], "Retired"),
            (&["prefer not to say"], UNKNOWN),
        ],
        "Other",
    )
}

pub const EMPLOYMENT_LABELS: &[&str] = &[
    "Full-time",
    "Part-time",
    "Self-employed",
    "Unemployed",
    "Retired",
    "Other",
    UNKNOWN,
];

pub fn org_size_rules() -> RuleSet {
    RuleSet::new(
        &[
            (&["fewer than 10"], "0-9"),
            (&["10 to 19"], "10-19"),
            (&["20 to 99"], "20-99"),
            (&["100 to 499"], "100-499"),
            (&["500 to 999"], "500-999"),
            (&["1,000 to 4,999"], "1000-4999"),
            (&["5,000 to 9,999"], "5000-9999"),
            (&["10,000 or more"], "10000+"),
        ],
        UNKNOWN,
    )
}

/// Ordinal ranking of organisation sizes, `Unknown` lowest.
pub const ORG_SIZE_LABELS: &[&str] = &[
    UNKNOWN,
    "0-9",
    "10-19",
    "20-99",
    "100-499",
    "500-999",
    "1000-4999",
    "5000-9999",
    "10000+",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn education_first_match_wins() {
        let rules = education_rules();
        assert_eq!(
            rules.classify("Bachelor’s degree (B.A., B.S., B.Eng., etc.)"),
            "Bachelor's"
        );
        assert_eq!(
            rules.classify("Master’s degree (M.A., M.S., M.Eng., MBA, etc.)"),
            "Master's"
        );
        assert_eq!(
            rules.classify("Secondary school (e.g. American high school, German Realschule)"),
            "Secondary"
        );
        assert_eq!(
            rules.classify("Some college/university study without earning a degree"),
            "Some college"
        );
        assert_eq!(
            rules.classify("Other doctoral degree (Ph.D., Ed.D., etc.)"),
            "Doctorate"
        );
        assert_eq!(
            rules.classify("Professional degree (JD, MD, etc.)"),
            "Professional"
        );
        assert_eq!(rules.classify("I prefer not to answer"), UNKNOWN);
        assert_eq!(rules.classify("Something else"), "Other");
        assert_eq!(rules.classify(UNKNOWN), UNKNOWN);
    }

    #[test]
    fn employment_buckets_free_text() {
        let rules = employment_rules();
        assert_eq!(rules.classify("Employed full-time"), "Full-time");
        assert_eq!(
            rules.classify("Independent contractor, freelancer, or self-employed"),
            "Self-employed"
        );
        assert_eq!(
            rules.classify("Not employed, but looking for work"),
            "Unemployed"
        );
        assert_eq!(rules.classify("Retired"), "Retired");
        assert_eq!(rules.classify("I prefer not to say"), UNKNOWN);
        assert_eq!(rules.classify("Student"), "Other");
    }

    #[test]
    fn org_size_unmatched_is_unknown() {
        let rules = org_size_rules();
        assert_eq!(rules.classify("Fewer than 10 employees"), "0-9");
        assert_eq!(rules.classify("1,000 to 4,999 employees"), "1000-4999");
        assert_eq!(rules.classify("10,000 or more employees"), "10000+");
        assert_eq!(rules.classify("I don't know"), UNKNOWN);
    }

    #[test]
    fn org_size_sole_freelancer_is_unknown() {
        let rules = org_size_rules();
        assert_eq!(rules.classify("10 to 19 employees"), "10-19");
        assert_eq!(rules.classify("Just me - I am a freelancer"), UNKNOWN);
    }
}
