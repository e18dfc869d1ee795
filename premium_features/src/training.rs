//! Encoding of raw claims records into model rows.
//!
//! The fitting itself happens outside this workspace, but it must see rows
//! laid out exactly like the ones the server builds from requests, so the
//! categorical mapping lives here next to the request parser.

use std::io::Read;

use log::info;
use serde::Deserialize;

use crate::error::{ProfileError, TrainingError};
use crate::profile::{ApplicantProfile, Sex, Smoker};
use crate::schema::FeatureVector;

/// One row of the historical claims CSV (`age,sex,bmi,children,smoker,region,expenses`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRecord {
    pub age: u32,
    pub sex: String,
    pub bmi: f64,
    pub children: u32,
    pub smoker: String,
    /// Present in the dataset, not a model input.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(alias = "charges")]
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub expenses: f64,
}

impl ClaimRecord {
    /// `sex`: female = 1, male = 0. `smoker`: yes = 1, no = 0.
    pub fn encode(&self) -> Result<TrainingRow, ProfileError> {
        let sex = match self.sex.trim().to_ascii_lowercase().as_str() {
            "female" => Sex::Female,
            "male" => Sex::Male,
            _ => {
                return Err(ProfileError::InvalidFieldType {
                    field: "sex",
                    raw: self.sex.clone(),
                });
            }
        };
        let smoker = match self.smoker.trim().to_ascii_lowercase().as_str() {
            "yes" => Smoker::Yes,
            "no" => Smoker::No,
            _ => {
                return Err(ProfileError::InvalidFieldType {
                    field: "smoker",
                    raw: self.smoker.clone(),
                });
            }
        };

        let profile = ApplicantProfile {
            age: self.age,
            sex,
            bmi: self.bmi,
            children: self.children,
            smoker,
        };

        Ok(TrainingRow {
            features: profile.feature_vector(),
            expenses: self.expenses,
        })
    }
}

/// Read and encode every record of a headed claims CSV.
pub fn read_training_set<R: Read>(reader: R) -> Result<Vec<TrainingRow>, TrainingError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<ClaimRecord>().enumerate() {
        let record = record?;
        let row = record
            .encode()
            .map_err(|source| TrainingError::Record { record: index + 1, source })?;
        rows.push(row);
    }

    info!("Encoded {} training rows", rows.len());
    Ok(rows)
}
