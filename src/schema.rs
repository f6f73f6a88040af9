//! Canonical survey schema and the historical alias registry.
//!
//! Every yearly export names the same survey concept differently
//! (`FormalEducation` in one year, `EdLevel` in another). The
//! [`CanonicalSchema`] lists the unified field names in a fixed order and,
//! for each one, the raw headers known to carry it, oldest first.
//!
//! ## Responsibilities
//!
//! - Built-in alias table covering the 2017 onward exports
//! - Reverse lookup from a raw header to its canonical field
//! - Registry validation (no duplicate fields, no alias claimed twice)
//! - Version label plus a SHA-256 fingerprint of the field/alias list
//! - YAML loading and saving through `serde_yaml`

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, Result};

pub const CURRENT_SCHEMA_VERSION: &str = "2024.1";

/// Aspirational fields that are harmonised per year but never merged.
pub const DESIRED_FIELDS: &[&str] = &[
    "db_desired",
    "langs_desired",
    "platform_desired",
    "webframe_desired",
];

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("country", &["Country"]),
    ("employment", &["EmploymentStatus", "Employment"]),
    ("education_level", &["FormalEducation", "EdLevel"]),
    ("org_size", &["CompanySize", "OrgSize"]),
    ("dev_type", &["DeveloperType", "DevType"]),
    ("years_code_total", &["YearsProgram", "YearsCoding", "YearsCode"]),
    ("years_code_pro", &["YearsCodedJob", "YearsCodingProf", "YearsCodePro"]),
    ("currency", &["Currency", "CurrencySymbol"]),
    (
        "compensation_total",
        &[
            "Salary",
            "ConvertedSalary",
            "CompTotal",
            "ConvertedComp",
            "ConvertedCompYearly",
        ],
    ),
    (
        "langs_worked",
        &[
            "HaveWorkedLanguage",
            "LanguageWorkedWith",
            "LanguageHaveWorkedWith",
        ],
    ),
    (
        "langs_desired",
        &[
            "WantWorkLanguage",
            "LanguageDesireNextYear",
            "LanguageWantToWorkWith",
        ],
    ),
    (
        "db_worked",
        &[
            "HaveWorkedDatabase",
            "DatabaseWorkedWith",
            "DatabaseHaveWorkedWith",
        ],
    ),
    (
        "db_desired",
        &[
            "WantWorkDatabase",
            "DatabaseDesireNextYear",
            "DatabaseWantToWorkWith",
        ],
    ),
    (
        "platform_worked",
        &[
            "HaveWorkedPlatform",
            "PlatformWorkedWith",
            "PlatformHaveWorkedWith",
        ],
    ),
    (
        "platform_desired",
        &[
            "WantWorkPlatform",
            "PlatformDesireNextYear",
            "PlatformWantToWorkWith",
        ],
    ),
    (
        "webframe_worked",
        &[
            "HaveWorkedFramework",
            "FrameworkWorkedWith",
            "WebFrameWorkedWith",
            "WebframeWorkedWith",
            "WebframeHaveWorkedWith",
        ],
    ),
    (
        "webframe_desired",
        &[
            "WantWorkFramework",
            "FrameworkDesireNextYear",
            "WebFrameDesireNextYear",
            "WebframeDesireNextYear",
            "WebframeWantToWorkWith",
        ],
    ),
    (
        "operating_system",
        &[
            "OperatingSystem",
            "OpSys",
            "OpSysPersonal use",
            "OpSysProfessional use",
        ],
    ),
    ("so_visit_freq", &["StackOverflowVisit", "SOVisitFreq"]),
    ("so_account", &["StackOverflowHasAccount", "SOAccount"]),
    ("so_part_freq", &["StackOverflowParticipate", "SOPartFreq"]),
    ("so_community", &["StackOverflowCommunity", "SOComm"]),
    ("age", &["Age"]),
    ("survey_ease", &["SurveyEasy", "SurveyEase"]),
    ("gender", &["Gender"]),
    ("ethnicity", &["Race", "RaceEthnicity", "Ethnicity"]),
    ("main_branch", &["MainBranch"]),
    (
        "misc_tech_worked",
        &["MiscTechWorkedWith", "MiscTechHaveWorkedWith"],
    ),
    (
        "misc_tech_desired",
        &["MiscTechDesireNextYear", "MiscTechWantToWorkWith"],
    ),
    ("job_satisfaction", &["JobSatisfaction", "JobSat"]),
    ("career_satisfaction", &["CareerSatisfaction", "CareerSat"]),
    ("open_source", &["OpenSource", "OpenSourcer"]),
    (
        "last_job_change",
        &["LastNewJob", "LastHireDate", "NEWJobHunt", "NEWOnboardGood"],
    ),
    (
        "job_factors",
        &[
            "JobFactors",
            "AssessJob1",
            "AssessJob2",
            "AssessJob3",
            "AssessJob4",
            "AssessJob5",
            "AssessJob6",
            "AssessJob7",
            "AssessJob8",
            "AssessJob9",
            "AssessJob10",
        ],
    ),
    ("undergrad_major", &["MajorUndergrad", "UndergradMajor"]),
    ("work_life_balance", &["ExCoderBalance", "BetterLife"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalField {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CanonicalField {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub fields: Vec<CanonicalField>,
    #[serde(default = "default_merge_exclusions")]
    pub merge_exclusions: Vec<String>,
}

fn default_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

fn default_merge_exclusions() -> Vec<String> {
    DESIRED_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CanonicalSchema {
    pub fn builtin() -> Self {
        Self {
            schema_version: default_schema_version(),
            fields: BUILTIN_ALIASES
                .iter()
                .map(|(name, aliases)| CanonicalField::new(name, aliases))
                .collect(),
            merge_exclusions: default_merge_exclusions(),
        }
    }

    pub fn from_fields(fields: Vec<CanonicalField>) -> Result<Self> {
        let schema = Self {
            schema_version: default_schema_version(),
            fields,
            merge_exclusions: default_merge_exclusions(),
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical field carrying the raw header `raw`, if any.
    pub fn canonical_for<'a>(&'a self, raw: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|field| field.name == raw || field.aliases.iter().any(|a| a == raw))
            .map(|field| field.name.as_str())
    }

    pub fn is_merge_excluded(&self, name: &str) -> bool {
        self.merge_exclusions.iter().any(|n| n == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(PipelineError::EmptySchema(
                "canonical schema defines no fields".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "canonical field names cannot be empty".to_string(),
                ));
            }
            if !names.insert(field.name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "canonical field '{}' is declared more than once",
                    field.name
                )));
            }
        }
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for field in &self.fields {
            for alias in &field.aliases {
                if names.contains(alias.as_str()) && alias != &field.name {
                    return Err(PipelineError::InvalidConfig(format!(
                        "alias '{alias}' of '{}' collides with a canonical field name",
                        field.name
                    )));
                }
                if let Some(owner) = claimed.insert(alias.as_str(), field.name.as_str())
                    && owner != field.name
                {
                    return Err(PipelineError::InvalidConfig(format!(
                        "alias '{alias}' is claimed by both '{owner}' and '{}'",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// SHA-256 over the ordered field names and their aliases. Two registries
    /// with the same fingerprint harmonise every export identically.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in &self.fields {
            hasher.update(field.name.as_bytes());
            hasher.update(b":");
            hasher.update(field.aliases.join(",").as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(b"exclude:");
        hasher.update(self.merge_exclusions.join(",").as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let schema: CanonicalSchema = serde_yaml::from_reader(BufReader::new(file))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}
