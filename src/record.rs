use serde::Serialize;

/// Written in place of any field whose element could not be found.
pub const NOT_AVAILABLE: &str = "N/A";

/// One extracted listing. Field order is the column order of the output files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Salary")]
    pub salary: String,
    #[serde(rename = "Contract Type")]
    pub contract_type: String,
    #[serde(rename = "Benefits")]
    pub benefits: String,
    #[serde(rename = "Link")]
    pub link: String,
}

pub const COLUMNS: [&str; 7] = [
    "Title",
    "Rating",
    "Location",
    "Salary",
    "Contract Type",
    "Benefits",
    "Link",
];

pub fn or_sentinel(v: Option<String>) -> String {
    v.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
