use serde::{Deserialize, Deserializer, Serialize};

/// Categorical feature columns, in pipeline order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race_ethnicity",
    "parental_level_of_education",
    "lunch",
    "test_preparation_course",
];

/// Numeric feature columns, in pipeline order.
pub const NUMERIC_COLUMNS: [&str; 2] = ["reading_score", "writing_score"];

/// One student as submitted to `POST /api/predict`.
///
/// The wire names follow the prediction form: the race/ethnicity group is
/// posted as `ethnicity`, and the score fields arrive as strings because
/// form values are strings. Both JSON numbers and numeric strings are
/// accepted for the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    #[serde(rename = "ethnicity")]
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    #[serde(deserialize_with = "score_from_number_or_string")]
    pub reading_score: f64,
    #[serde(deserialize_with = "score_from_number_or_string")]
    pub writing_score: f64,
}

impl StudentRecord {
    /// Categorical values keyed by column name, in pipeline order.
    pub fn categorical(&self) -> [(&'static str, &str); 5] {
        [
            ("gender", self.gender.as_str()),
            ("race_ethnicity", self.race_ethnicity.as_str()),
            (
                "parental_level_of_education",
                self.parental_level_of_education.as_str(),
            ),
            ("lunch", self.lunch.as_str()),
            (
                "test_preparation_course",
                self.test_preparation_course.as_str(),
            ),
        ]
    }

    /// Numeric values keyed by column name, in pipeline order.
    pub fn numeric(&self) -> [(&'static str, f64); 2] {
        [
            ("reading_score", self.reading_score),
            ("writing_score", self.writing_score),
        ]
    }
}

fn score_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("could not convert string to float: '{s}'"))
        }),
    }
}
