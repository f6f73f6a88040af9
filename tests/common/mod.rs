#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a survey export at `data/<year>/<year>.csv` and returns the data directory.
    pub fn write_year(&self, year: i32, contents: &str) -> PathBuf {
        self.write(&format!("data/{year}/{year}.csv"), contents);
        self.data_dir()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }
}

/// Two small exports with different header spellings for the same concepts.
pub const EXPORT_2019: &str = "\
Respondent,Country,CurrencySymbol,ConvertedComp,LanguageWorkedWith,EdLevel,Employment,OrgSize,YearsCodePro,Hobbyist
1,United States,USD,120000,Rust;Go,\"Bachelor’s degree (B.A., B.S., B.Eng., etc.)\",Employed full-time,20 to 99 employees,7,Yes
2,Germany,EUR,\"60,000\",Python,\"Master’s degree (M.A., M.S., M.Eng., MBA, etc.)\",Employed full-time,\"10,000 or more employees\",Less than 1 year,No
3,India,INR,900000,Python;SQL,Some college/university study without earning a degree,\"Independent contractor, freelancer, or self-employed\",NA,3,Yes
4,Peru,,50000,Go,NA,Retired,NA,More than 50 years,No
";

pub const EXPORT_2020: &str = "\
Respondent,Country,Currency,CompTotal,LanguageHaveWorkedWith,EdLevel,Employment,OrgSize,YearsCodePro
1,United States of America,USD,95000,Rust,\"Bachelor’s degree (B.A., B.S., B.Eng., etc.)\",\"Employed, full-time\",100 to 499 employees,12
2,Peru,XYZ,20000,Go;SQL,NA,Retired,2 to 9 employees,NA
3,United Kingdom of Great Britain and Northern Ireland,GBP,\"1.234,56\",NA,\"Doctoral degree (Ph.D., Ed.D., etc.)\",Employed part-time,NA,20 or more years
";

/// Creates a workspace holding both sample years.
pub fn survey_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.write_year(2019, EXPORT_2019);
    workspace.write_year(2020, EXPORT_2020);
    workspace
}
