use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: Option<Data>,
    pub message: Option<String>,
    pub code: Option<String>,
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Data {
    #[serde(rename = "rowset")]
    pub rowset: Option<Vec<Vec<Option<String>>>>,
    #[serde(rename = "rowType")]
    pub row_type: Option<Vec<RowType>>,
    #[serde(rename = "total")]
    pub total: Option<i64>,
    #[serde(rename = "returned")]
    pub returned: Option<i64>,
    #[serde(rename = "queryId")]
    pub query_id: Option<String>,
    #[serde(rename = "sqlState")]
    pub sql_state: Option<String>,
    #[serde(rename = "command")]
    pub command: Option<String>,
    #[serde(rename = "getResultUrl")]
    pub get_result_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub nullable: bool,
}
