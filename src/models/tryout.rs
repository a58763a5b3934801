// src/models/tryout.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Study material attached to a tryout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "type")]
    pub material_type: String,
    pub title: String,
    pub url: String,
}

/// A named exam inside a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tryout {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub created_at: Option<String>,

    pub paket_id: String,

    #[serde(default)]
    pub pdf_url: Option<String>,

    /// Preferred duration source when an attempt carries none.
    #[serde(default)]
    pub duration_minutes: Option<i64>,

    #[serde(default)]
    pub materials: Vec<Material>,

    #[serde(default, rename = "attemptsAllowed")]
    pub attempts_allowed: Option<u32>,

    #[serde(default, rename = "timeLimit")]
    pub time_limit: Option<String>,

    #[serde(default, rename = "gradingMethod")]
    pub grading_method: Option<String>,
}

/// Package listed in the public catalog (`GET /pakets`). Price is a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub price: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub detail1: Option<String>,
    #[serde(default)]
    pub detail2: Option<String>,
    #[serde(default)]
    pub detail3: Option<String>,
    #[serde(default)]
    pub detail4: Option<String>,
    #[serde(default)]
    pub detail5: Option<String>,
}

impl Package {
    /// Non-empty detail lines in order.
    pub fn details(&self) -> Vec<&str> {
        [
            &self.detail1,
            &self.detail2,
            &self.detail3,
            &self.detail4,
            &self.detail5,
        ]
        .into_iter()
        .filter_map(|d| d.as_deref())
        .filter(|d| !d.is_empty())
        .collect()
    }
}

/// Package the user has purchased (`GET /user-pakets`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedPackage {
    pub id: String,
    pub name: String,

    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl OwnedPackage {
    /// A package is expired once its closing date has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.closed_at.is_some_and(|closed| closed < now)
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
