use serde::{Deserialize, Serialize};

/// One of the predefined product categories.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}
