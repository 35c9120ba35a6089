use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: serde_json::Value,
    pub user_id: Option<i64>,
}
