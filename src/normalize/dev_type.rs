use std::collections::BTreeMap;

use crate::data::{Cell, OTHER, UNKNOWN};

pub const DEV_TYPE_LABELS: &[&str] = &[
    "Backend",
    "Frontend",
    "Fullstack",
    "Mobile",
    "Data/ML",
    "QA/Test",
    "DevOps",
    "Embedded",
    "Cloud/Infra",
    "Manager",
    "Academic",
    "C-Suite",
    OTHER,
    UNKNOWN,
];

const DEV_TYPE_MAP: &[(&str, &str)] = &[
    ("Back-end developer", "Backend"),
    ("Developer, back-end", "Backend"),
    ("Front-end developer", "Frontend"),
    ("Developer, front-end", "Frontend"),
    ("Full-stack developer", "Fullstack"),
    ("Developer, full-stack", "Fullstack"),
    ("Mobile developer", "Mobile"),
    ("Developer, mobile", "Mobile"),
    ("Data scientist", "Data/ML"),
    ("Machine learning specialist", "Data/ML"),
    ("Data or business analyst", "Data/ML"),
    ("Data engineer", "Data/ML"),
    ("Engineer, data", "Data/ML"),
    ("QA or test developer", "QA/Test"),
    ("Quality assurance engineer", "QA/Test"),
    ("Developer, QA or test", "QA/Test"),
    ("DevOps specialist", "DevOps"),
    ("Engineer, site reliability", "DevOps"),
    ("Embedded applications/devices developer", "Embedded"),
    ("Embedded applications or devices developer", "Embedded"),
    ("Cloud infrastructure engineer", "Cloud/Infra"),
    ("Systems administrator", "Cloud/Infra"),
    ("System administrator", "Cloud/Infra"),
    ("Engineering manager", "Manager"),
    ("Project manager", "Manager"),
    ("Product manager", "Manager"),
    ("Academic researcher", "Academic"),
    ("Educator", "Academic"),
    ("Educator or academic researcher", "Academic"),
    ("C-suite executive (CEO, CTO, etc.)", "C-Suite"),
    ("Senior executive/VP", "C-Suite"),
    ("Senior Executive (C-Suite, VP, etc.)", "C-Suite"),
];

pub fn builtin_dev_types() -> BTreeMap<String, String> {
    DEV_TYPE_MAP
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Maps a job-title answer onto a coarse role. Only exact titles are
/// recognised; for a pre-split collection the first choice decides.
pub fn classify_dev_type<'a>(cell: &Cell, map: &'a BTreeMap<String, String>) -> &'a str {
    let title = match cell {
        Cell::Null => return UNKNOWN,
        Cell::Text(raw) if raw == UNKNOWN => return UNKNOWN,
        Cell::Text(raw) => raw.as_str(),
        Cell::List(items) => match items.first() {
            Some(first) => first.as_str(),
            None => return UNKNOWN,
        },
        Cell::Number(_) => return OTHER,
    };
    map.get(title).map(String::as_str).unwrap_or(OTHER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_titles_map_to_roles() {
        let map = builtin_dev_types();
        assert_eq!(
            classify_dev_type(&Cell::text("Developer, back-end"), &map),
            "Backend"
        );
        assert_eq!(
            classify_dev_type(&Cell::text("Senior Executive (C-Suite, VP, etc.)"), &map),
            "C-Suite"
        );
        assert_eq!(classify_dev_type(&Cell::Null, &map), UNKNOWN);
    }

    #[test]
    fn unmapped_multi_select_text_is_other() {
        let map = builtin_dev_types();
        assert_eq!(
            classify_dev_type(
                &Cell::text("Developer, back-end;Developer, front-end"),
                &map
            ),
            OTHER
        );
    }

    #[test]
    fn collections_use_their_first_choice() {
        let map = builtin_dev_types();
        let cell = Cell::List(vec!["Data scientist".into(), "Educator".into()]);
        assert_eq!(classify_dev_type(&cell, &map), "Data/ML");
        assert_eq!(classify_dev_type(&Cell::List(Vec::new()), &map), UNKNOWN);
    }

    #[test]
    fn every_mapped_role_is_a_known_label() {
        for role in builtin_dev_types().values() {
            assert!(DEV_TYPE_LABELS.contains(&role.as_str()), "{role}");
        }
    }
}
