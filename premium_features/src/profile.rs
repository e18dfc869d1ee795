use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProfileError;
use crate::schema::{Feature, FeatureVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn code(&self) -> u8 {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Sex::Male),
            1 => Some(Sex::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoker {
    No,
    Yes,
}

impl Smoker {
    pub fn code(&self) -> u8 {
        match self {
            Smoker::No => 0,
            Smoker::Yes => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Smoker::No),
            1 => Some(Smoker::Yes),
            _ => None,
        }
    }
}

/// One applicant as submitted under `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub age: u32,
    pub sex: Sex,
    pub bmi: f64,
    pub children: u32,
    pub smoker: Smoker,
}

impl ApplicantProfile {
    /// Read and coerce the five applicant fields out of a `user_data` object.
    ///
    /// Numbers and numeric strings are both accepted since browser forms post
    /// every field as text. Reals given for integer fields are truncated.
    pub fn from_json(data: &Value) -> Result<Self, ProfileError> {
        if !data.is_object() {
            return Err(ProfileError::InvalidFieldType {
                field: "user_data",
                raw: raw_text(data),
            });
        }

        let age = coerce_int(required(data, "age")?, "age")?;
        let sex = coerce_int(required(data, "sex")?, "sex")?;
        let children = coerce_int(required(data, "children")?, "children")?;
        let bmi = coerce_real(required(data, "bmi")?, "bmi")?;
        let smoker = coerce_int(required(data, "smoker")?, "smoker")?;

        let profile = Self {
            age: u32::try_from(age)
                .ok()
                .filter(|age| *age > 0)
                .ok_or_else(|| out_of_range("age", age))?,
            sex: Sex::from_code(sex).ok_or_else(|| out_of_range("sex", sex))?,
            bmi: Some(bmi)
                .filter(|bmi| *bmi > 0.0)
                .ok_or_else(|| out_of_range("bmi", bmi))?,
            children: u32::try_from(children).map_err(|_| out_of_range("children", children))?,
            smoker: Smoker::from_code(smoker).ok_or_else(|| out_of_range("smoker", smoker))?,
        };

        debug!("Parsed applicant profile: {:?}", profile);
        Ok(profile)
    }

    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector::assemble(|feature| match feature {
            Feature::Age => f64::from(self.age),
            Feature::Sex => f64::from(self.sex.code()),
            Feature::Bmi => self.bmi,
            Feature::Children => f64::from(self.children),
            Feature::Smoker => f64::from(self.smoker.code()),
        })
    }
}

fn required<'a>(data: &'a Value, field: &'static str) -> Result<&'a Value, ProfileError> {
    match data.get(field) {
        None | Some(Value::Null) => Err(ProfileError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn coerce_int(value: &Value, field: &'static str) -> Result<i64, ProfileError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| invalid_type(field, value))
}

fn coerce_real(value: &Value, field: &'static str) -> Result<f64, ProfileError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| invalid_type(field, value))
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn invalid_type(field: &'static str, value: &Value) -> ProfileError {
    ProfileError::InvalidFieldType {
        field,
        raw: raw_text(value),
    }
}

fn out_of_range(field: &'static str, value: impl ToString) -> ProfileError {
    ProfileError::OutOfRange {
        field,
        raw: value.to_string(),
    }
}
