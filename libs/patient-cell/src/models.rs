use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_models::error::FieldError;

use crate::services::store::StoreError;

pub const PATIENT_ID_PATTERN: &str = r"^P\d{3}$";
pub const MAX_AGE: i64 = 120;

static PATIENT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PATIENT_ID_PATTERN).expect("patient id pattern compiles"));

// =====================================================================================
// ENUMS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl FromStr for Gender {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "others" => Ok(Gender::Others),
            _ => Err(FieldError::new(
                "gender",
                format!("must be one of 'male', 'female', 'others', got '{}'", value),
            )),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Verdict {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obesity,
}

impl Verdict {
    /// Band a BMI value.
    ///
    /// `[24.9, 25)` and everything from 29.9 up land in `Obesity`; the
    /// bands are kept exactly as published rather than made contiguous.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if (18.5..24.9).contains(&bmi) {
            Verdict::NormalWeight
        } else if (25.0..29.9).contains(&bmi) {
            Verdict::Overweight
        } else {
            Verdict::Obesity
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::NormalWeight => "Normal weight",
            Verdict::Overweight => "Overweight",
            Verdict::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `weight / height²`, rounded to two decimal places.
pub fn compute_bmi(height: f64, weight: f64) -> f64 {
    round2(weight / (height * height))
}

/// Round the exact binary value of `value`, ties to even. Values that have no
/// decimal form (non-finite, or beyond the decimal range) come back unchanged.
fn round2(value: f64) -> f64 {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
            // One correctly rounded division lands on the f64 nearest the decimal.
            rounded.mantissa() as f64 / 10f64.powi(rounded.scale() as i32)
        }
        None => value,
    }
}

// =====================================================================================
// PATIENT
// =====================================================================================

/// A fully validated patient. Only obtainable through
/// [`CreatePatientRequest::validate`], so every instance satisfies the
/// field constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    id: String,
    name: String,
    city: String,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
}

impl Patient {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        compute_bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }

    /// Stored form, with derived fields filled in.
    pub fn to_record(&self) -> PatientRecord {
        PatientRecord {
            name: self.name.clone(),
            city: self.city.clone(),
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
            bmi: self.bmi(),
            verdict: self.verdict(),
        }
    }

    pub fn to_view(&self) -> PatientView {
        PatientView {
            id: self.id.clone(),
            record: self.to_record(),
        }
    }
}

/// One value of the persisted document, keyed by patient ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    /// Meters
    pub height: f64,
    /// Kilograms
    pub weight: f64,
    /// `weight / height²`, two decimal places
    #[schema(example = 22.86)]
    pub bmi: f64,
    pub verdict: Verdict,
}

impl PatientRecord {
    pub fn sort_key(&self, field: SortField) -> f64 {
        match field {
            SortField::Weight => self.weight,
            SortField::Height => self.height,
            SortField::Bmi => self.bmi,
        }
    }
}

/// A record annotated with its ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientView {
    #[schema(example = "P001")]
    pub id: String,
    #[serde(flatten)]
    pub record: PatientRecord,
}

// =====================================================================================
// REQUESTS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    /// The unique identifier of the patient (e.g., P001, P002)
    #[schema(example = "P001", pattern = "^P\\d{3}$")]
    pub id: String,
    /// Full name of the patient
    pub name: String,
    /// City of residence
    pub city: String,
    /// Age of the patient
    #[schema(exclusive_minimum = 0, exclusive_maximum = 120)]
    pub age: i64,
    /// Gender of the patient: `male`, `female` or `others`
    #[schema(example = "female")]
    pub gender: String,
    /// Height in meters
    #[schema(exclusive_minimum = 0)]
    pub height: f64,
    /// Weight in kilograms
    #[schema(exclusive_minimum = 0)]
    pub weight: f64,
}

impl CreatePatientRequest {
    /// Check every field constraint and build the patient, or return all
    /// violations found.
    pub fn validate(self) -> Result<Patient, Vec<FieldError>> {
        let mut errors = Vec::new();

        if !PATIENT_ID_REGEX.is_match(&self.id) {
            errors.push(FieldError::new(
                "id",
                format!("must match pattern {}", PATIENT_ID_PATTERN),
            ));
        }
        check_not_blank(&mut errors, "name", &self.name);
        check_not_blank(&mut errors, "city", &self.city);

        if self.age <= 0 || self.age >= MAX_AGE {
            errors.push(FieldError::new(
                "age",
                format!("must be greater than 0 and less than {}", MAX_AGE),
            ));
        }

        let gender = match self.gender.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        check_positive(&mut errors, "height", self.height);
        check_positive(&mut errors, "weight", self.weight);

        if self.height > 0.0 && self.weight > 0.0 && !compute_bmi(self.height, self.weight).is_finite() {
            errors.push(FieldError::new("bmi", "height and weight produce a non-finite BMI"));
        }

        match gender {
            Some(gender) if errors.is_empty() => Ok(Patient {
                id: self.id,
                name: self.name,
                city: self.city,
                age: self.age as u32,
                gender,
                height: self.height,
                weight: self.weight,
            }),
            _ => Err(errors),
        }
    }
}

/// Sparse edit body. Absent and `null` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    #[schema(exclusive_minimum = 0)]
    pub age: Option<i64>,
    pub gender: Option<String>,
    #[schema(exclusive_minimum = 0)]
    pub height: Option<f64>,
    #[schema(exclusive_minimum = 0)]
    pub weight: Option<f64>,
}

impl UpdatePatientRequest {
    /// Constraints checked on the edit body alone. Narrower than creation:
    /// no upper bound on age.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Some(age) = self.age {
            if age <= 0 {
                errors.push(FieldError::new("age", "must be greater than 0"));
            }
        }
        if let Some(gender) = &self.gender {
            if let Err(e) = gender.parse::<Gender>() {
                errors.push(e);
            }
        }
        if let Some(height) = self.height {
            check_positive(&mut errors, "height", height);
        }
        if let Some(weight) = self.weight {
            check_positive(&mut errors, "weight", weight);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Overlay the provided fields onto a stored record, producing a full
    /// request that still has to pass [`CreatePatientRequest::validate`].
    pub fn merge_onto(self, id: &str, existing: &PatientRecord) -> CreatePatientRequest {
        CreatePatientRequest {
            id: id.to_string(),
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            city: self.city.unwrap_or_else(|| existing.city.clone()),
            age: self.age.unwrap_or(i64::from(existing.age)),
            gender: self.gender.unwrap_or_else(|| existing.gender.as_str().to_string()),
            height: self.height.unwrap_or(existing.height),
            weight: self.weight.unwrap_or(existing.weight),
        }
    }
}

fn check_not_blank(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
}

fn check_positive(errors: &mut Vec<FieldError>, field: &str, value: f64) {
    // NaN fails this comparison too
    if !(value > 0.0) {
        errors.push(FieldError::new(field, "must be greater than 0"));
    }
}

// =====================================================================================
// SORTING
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Weight,
    Height,
    Bmi,
}

impl FromStr for SortField {
    type Err = PatientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "weight" => Ok(SortField::Weight),
            "height" => Ok(SortField::Height),
            "bmi" => Ok(SortField::Bmi),
            _ => Err(PatientError::InvalidSort(
                "Invalid sort field. Choose from weight, height, bmi.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = PatientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(PatientError::InvalidSort(
                "Invalid order value. Choose 'asc' or 'desc'.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortQuery {
    /// Field to sort by: `weight`, `height` or `bmi`
    #[param(example = "weight")]
    pub sortby: Option<String>,
    /// Sort order: `asc` or `desc`
    #[param(example = "asc")]
    pub order: Option<String>,
}

impl SortQuery {
    pub fn parse(&self) -> Result<(SortField, SortOrder), PatientError> {
        let field = match self.sortby.as_deref() {
            Some(raw) => raw.parse()?,
            None => SortField::default(),
        };
        let order = match self.order.as_deref() {
            Some(raw) => raw.parse()?,
            None => SortOrder::default(),
        };
        Ok((field, order))
    }
}

// =====================================================================================
// RESPONSES
// =====================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "patient updated")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientCreatedResponse {
    #[schema(example = "Patient with ID P001 created successfully.")]
    pub message: String,
    pub patient: PatientView,
}

// =====================================================================================
// ERRORS
// =====================================================================================

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient with ID {0} not found")]
    NotFound(String),

    #[error("Patient with ID {0} already exists.")]
    AlreadyExists(String),

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    InvalidSort(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
