use serde::{Deserialize, Serialize};

use crate::dataset::DatasetFile;
use crate::error::ValidationError;
use crate::validation::{validate_dataset_name, validate_timestamp, validate_user_id};

/// An immutable download record: `user` fetched `files` of a dataset at
/// `time`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub dataset_owner: String,
    pub dataset_name: String,
    pub user: String,
    #[serde(default)]
    pub files: Vec<DatasetFile>,
    pub time: String,
}

impl Record {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id("dataset owner", &self.dataset_owner)?;
        validate_dataset_name(&self.dataset_name)?;
        validate_user_id("user id", &self.user)?;
        validate_timestamp("time", &self.time)?;
        for file in &self.files {
            file.validate()?;
        }
        Ok(())
    }
}
