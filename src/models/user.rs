use serde::{Deserialize, Serialize};

/// Identity resolved from the session store. The id is owned by that store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
