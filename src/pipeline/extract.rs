use serde_json::{Map, Value};

use crate::model::{
    Company, Education, Experience, Job, Location, NormalizedPosting, Salary,
};

/// Walk `path` through nested objects. Total: a missing key, a non-object
/// intermediate (e.g. `experienceRequirements` given as a bare string), or a
/// null leaf all yield `None` instead of faulting.
fn lookup<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    match current {
        Value::Null => None,
        v => Some(v),
    }
}

fn text(root: &Map<String, Value>, path: &[&str]) -> String {
    lookup(root, path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int(root: &Map<String, Value>, path: &[&str]) -> Option<i64> {
    lookup(root, path).and_then(Value::as_i64)
}

fn float(root: &Map<String, Value>, path: &[&str]) -> Option<f64> {
    lookup(root, path).and_then(Value::as_f64)
}

/// Flatten one raw JSON-LD `JobPosting` object into the relational shape.
/// Infallible on any object: absent or type-mismatched paths resolve to the
/// field's default. The description is still raw markup at this stage.
pub fn extract(raw: &Map<String, Value>) -> NormalizedPosting {
    NormalizedPosting {
        job: Job {
            title: text(raw, &["title"]),
            industry: text(raw, &["industry"]),
            description: text(raw, &["description"]),
            employment_type: text(raw, &["employmentType"]),
            date_posted: text(raw, &["datePosted"]),
        },
        company: Company {
            name: text(raw, &["hiringOrganization", "name"]),
            link: text(raw, &["hiringOrganization", "sameAs"]),
        },
        education: Education {
            required_credential: text(raw, &["educationRequirements", "credentialCategory"]),
        },
        experience: Experience {
            months_of_experience: int(raw, &["experienceRequirements", "monthsOfExperience"]),
            seniority_level: String::new(),
        },
        // Flat top-level keys, matching the upstream export rather than
        // schema.org's nested estimatedSalary.
        salary: Salary {
            currency: text(raw, &["salary_currency"]),
            min_value: float(raw, &["salary_min_value"]),
            max_value: float(raw, &["salary_max_value"]),
            unit: text(raw, &["salary_unit"]),
        },
        location: Location {
            country: text(raw, &["jobLocation", "address", "addressCountry"]),
            locality: text(raw, &["jobLocation", "address", "addressLocality"]),
            region: text(raw, &["jobLocation", "address", "addressRegion"]),
            postal_code: text(raw, &["jobLocation", "address", "postalCode"]),
            street_address: text(raw, &["jobLocation", "address", "streetAddress"]),
            latitude: float(raw, &["jobLocation", "latitude"]),
            longitude: float(raw, &["jobLocation", "longitude"]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(json: &str) -> Map<String, Value> {
        serde_json::from_str::<Value>(json)
            .unwrap()
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn full_posting() {
        let raw = obj(
            r#"{
                "title": "Data Engineer",
                "industry": "Software",
                "description": "<p>Build pipelines</p>",
                "employmentType": "FULL_TIME",
                "datePosted": "2024-01-02",
                "hiringOrganization": {"name": "Acme", "sameAs": "https://acme.example"},
                "educationRequirements": {"credentialCategory": "bachelor degree"},
                "experienceRequirements": {"monthsOfExperience": 36},
                "salary_currency": "USD",
                "salary_min_value": 90000,
                "salary_max_value": 120000.5,
                "salary_unit": "YEAR",
                "jobLocation": {
                    "latitude": 40.7128,
                    "longitude": -74.006,
                    "address": {
                        "addressCountry": "US",
                        "addressLocality": "New York",
                        "addressRegion": "NY",
                        "postalCode": "10001",
                        "streetAddress": "1 Main St"
                    }
                }
            }"#,
        );
        let p = extract(&raw);
        assert_eq!(p.job.title, "Data Engineer");
        assert_eq!(p.job.description, "<p>Build pipelines</p>");
        assert_eq!(p.company.name, "Acme");
        assert_eq!(p.company.link, "https://acme.example");
        assert_eq!(p.education.required_credential, "bachelor degree");
        assert_eq!(p.experience.months_of_experience, Some(36));
        assert_eq!(p.experience.seniority_level, "");
        assert_eq!(p.salary.currency, "USD");
        assert_eq!(p.salary.min_value, Some(90000.0));
        assert_eq!(p.salary.max_value, Some(120000.5));
        assert_eq!(p.location.country, "US");
        assert_eq!(p.location.latitude, Some(40.7128));
        assert_eq!(p.location.longitude, Some(-74.006));
    }

    #[test]
    fn empty_object_yields_all_defaults() {
        let p = extract(&obj("{}"));
        assert_eq!(p, NormalizedPosting::default());
        assert_eq!(p.job.title, "");
        assert_eq!(p.experience.months_of_experience, None);
        assert_eq!(p.salary.min_value, None);
        assert_eq!(p.location.latitude, None);
    }

    #[test]
    fn missing_nested_objects_default_without_fault() {
        let p = extract(&obj(r#"{"title": "Engineer"}"#));
        assert_eq!(p.job.title, "Engineer");
        assert_eq!(p.company.name, "");
        assert_eq!(p.location.street_address, "");
    }

    #[test]
    fn experience_requirements_as_string_defaults() {
        let p = extract(&obj(r#"{"experienceRequirements": "no requirements"}"#));
        assert_eq!(p.experience.months_of_experience, None);
    }

    #[test]
    fn null_and_mistyped_leaves_default() {
        let p = extract(&obj(
            r#"{
                "title": null,
                "industry": 42,
                "hiringOrganization": {"name": null},
                "salary_min_value": "not a number",
                "jobLocation": {"latitude": "40.7"}
            }"#,
        ));
        assert_eq!(p.job.title, "");
        assert_eq!(p.job.industry, "");
        assert_eq!(p.company.name, "");
        assert_eq!(p.salary.min_value, None);
        assert_eq!(p.location.latitude, None);
    }

    #[test]
    fn integer_latitude_reads_as_float() {
        let p = extract(&obj(r#"{"jobLocation": {"latitude": 41}}"#));
        assert_eq!(p.location.latitude, Some(41.0));
    }
}
