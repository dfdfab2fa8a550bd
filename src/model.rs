use serde::{Deserialize, Serialize};

/// One normalized job posting, grouped by target table. Every field is always
/// present; missing source data lands on the documented default instead.
/// The job row's generated id is assigned by the database at load time and is
/// not part of the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub job: Job,
    pub company: Company,
    pub education: Education,
    pub experience: Experience,
    pub salary: Salary,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    pub title: String,
    pub industry: String,
    /// Plain text after cleaning; raw markup between extraction and cleaning.
    pub description: String,
    pub employment_type: String,
    pub date_posted: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Education {
    pub required_credential: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Experience {
    #[serde(with = "num_or_blank")]
    pub months_of_experience: Option<i64>,
    /// Reserved column; no source path populates it.
    pub seniority_level: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Salary {
    pub currency: String,
    #[serde(with = "num_or_blank")]
    pub min_value: Option<f64>,
    #[serde(with = "num_or_blank")]
    pub max_value: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub street_address: String,
    #[serde(with = "num_or_blank")]
    pub latitude: Option<f64>,
    #[serde(with = "num_or_blank")]
    pub longitude: Option<f64>,
}

/// Staging files keep the upstream convention of `""` for an unknown numeric
/// value, while the model uses `Option` so unknown is never conflated with
/// zero. `Some(n)` round-trips as a JSON number, `None` as `""`.
pub(crate) mod num_or_blank {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(v) => v.serialize(ser),
            None => ser.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Num(T),
            Text(String),
        }
        Ok(match Raw::<T>::deserialize(de)? {
            Raw::Num(v) => Some(v),
            Raw::Text(_) => None,
        })
    }
}
