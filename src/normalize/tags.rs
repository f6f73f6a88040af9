use std::collections::BTreeMap;

use crate::data::{Cell, MULTI_VALUE_DELIMITER, UNKNOWN};

pub type SynonymMap = BTreeMap<String, String>;

const DB_SYNONYMS: &[(&str, &str)] = &[
    ("Microsoft SQL Server", "SQL Server"),
    ("SQL Server", "SQL Server"),
    ("Dynamodb", "DynamoDB"),
    ("DynamoDB", "DynamoDB"),
    ("Amazon DynamoDB", "DynamoDB"),
    ("IBM Db2", "IBM DB2"),
    ("IBM DB2", "IBM DB2"),
    ("Neo4J", "Neo4j"),
    ("Neo4j", "Neo4j"),
    ("Couch DB", "CouchDB"),
    ("CouchDB", "CouchDB"),
];

const LANG_SYNONYMS: &[(&str, &str)] = &[
    ("Matlab", "MATLAB"),
    ("MATLAB", "MATLAB"),
    ("Bash/Shell (all shells)", "Bash/Shell"),
    ("Bash/Shell", "Bash/Shell"),
    ("LISP", "Lisp"),
    ("Lisp", "Lisp"),
];

const PLATFORM_SYNONYMS: &[(&str, &str)] = &[
    ("AWS", "AWS"),
    ("Amazon Web Services (AWS)", "AWS"),
    ("Mac OS", "MacOS"),
    ("MacOS", "MacOS"),
    ("Linux Desktop", "Linux"),
    ("Linux", "Linux"),
    ("Google Cloud", "Google Cloud"),
    ("Google Cloud Platform", "Google Cloud"),
    ("DigitalOcean", "DigitalOcean"),
    ("Digital Ocean", "DigitalOcean"),
    ("IBM Cloud or Watson", "IBM Cloud"),
    ("IBM Cloud", "IBM Cloud"),
];

const WEBFRAME_SYNONYMS: &[(&str, &str)] = &[
    ("React.js", "React"),
    ("React", "React"),
    ("AngularJS", "Angular"),
    ("Angular.js", "Angular"),
    ("Angular", "Angular"),
    ("ASP.NET Core", ".NET Core"),
    (".NET Core", ".NET Core"),
    ("ASP.NET CORE", ".NET Core"),
    (".NET CORE", ".NET Core"),
];

fn to_map(pairs: &[(&str, &str)]) -> SynonymMap {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Built-in synonym tables keyed by canonical field name.
pub fn builtin_synonyms() -> BTreeMap<String, SynonymMap> {
    [
        ("db_worked", DB_SYNONYMS),
        ("langs_worked", LANG_SYNONYMS),
        ("platform_worked", PLATFORM_SYNONYMS),
        ("webframe_worked", WEBFRAME_SYNONYMS),
    ]
    .into_iter()
    .map(|(field, pairs)| (field.to_string(), to_map(pairs)))
    .collect()
}

fn canonical_token<'a>(token: &'a str, synonyms: &'a SynonymMap) -> &'a str {
    synonyms.get(token).map(String::as_str).unwrap_or(token)
}

/// Splits a multi-select answer, maps each choice through `synonyms` and
/// rejoins with `"; "`. Choices without an entry pass through trimmed.
pub fn canonicalize_tags(cell: &Cell, synonyms: &SynonymMap) -> Cell {
    let joined = match cell {
        Cell::Null => UNKNOWN.to_string(),
        Cell::Text(raw) => raw
            .split(MULTI_VALUE_DELIMITER)
            .map(|token| canonical_token(token.trim(), synonyms))
            .collect::<Vec<_>>()
            .join("; "),
        Cell::List(items) => items
            .iter()
            .map(|token| canonical_token(token.trim(), synonyms))
            .collect::<Vec<_>>()
            .join("; "),
        Cell::Number(_) => cell.as_display(),
    };
    Cell::Text(joined)
}
