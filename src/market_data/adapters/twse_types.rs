// Source: GET https://mis.twse.com.tw/stock/api/getStockInfo.jsp?ex_ch=tse_2330.tw&json=1&delay=0
// Every field is a string; "-" means no value yet.
#[derive(Debug, Default, serde::Deserialize)]
pub struct StockInfoResponse {
    #[serde(rename = "msgArray", default)]
    pub msg_array: Option<Vec<StockInfo>>,
    #[serde(default)]
    pub rtcode: Option<String>, // "0000" on success
    #[serde(default)]
    pub rtmessage: Option<String>,
}

// Only the last trade and previous close are read. The payload also carries
// high / low / open (`h`, `l`, `o`), which never stand in for a missing `z`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct StockInfo {
    #[serde(default)]
    pub z: Option<String>, // last traded price
    #[serde(default)]
    pub y: Option<String>, // previous close
}
