use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub personal_name: String,
}

/// A work record assembled from one dump line.
///
/// `author_names` is a snapshot taken when the work is loaded: it holds
/// whatever name the store had for each id at that moment, position for
/// position with `author_ids`. Later corrections to an author record do
/// not flow back into already-loaded books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub cover_ids: Vec<String>,
    pub author_ids: Vec<String>,
    pub author_names: Vec<String>,
}
