// Exchange-internal adapter (TWSE MIS getStockInfo).
// Needs both a User-Agent and a Referer or the upstream answers with an empty body.

use chrono::Utc;
use reqwest::header::REFERER;
use tracing::{debug, warn};

use super::twse_types::StockInfoResponse;
use super::{record_fetch, ProviderKind, QuoteProvider};
use crate::market_data::normaliser::Normaliser;
use crate::quote::types::RawQuote;

pub struct TwseAdapter {
    client: reqwest::Client,
    pub info_url: String, // "{base}/stock/api/getStockInfo.jsp"
    pub referer: String,  // "{base}/stock/index.jsp"
    normaliser: Normaliser,
}

impl TwseAdapter {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client,
            info_url: format!("{}/stock/api/getStockInfo.jsp", base),
            referer: format!("{}/stock/index.jsp", base),
            normaliser: Normaliser::default(),
        }
    }

    async fn request(&self, channel: &str) -> anyhow::Result<StockInfoResponse> {
        // `_` busts intermediate caches
        let cache_buster = Utc::now().timestamp_millis().to_string();
        let res = self
            .client
            .get(&self.info_url)
            .header(REFERER, &self.referer)
            .query(&[
                ("ex_ch", channel),
                ("json", "1"),
                ("delay", "0"),
                ("_", cache_buster.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json::<StockInfoResponse>().await?)
    }
}

/// "2330.TW" -> "tse_2330.tw", "6488.TWO" -> "otc_6488.tw"
pub fn exchange_channel(symbol: &str) -> Option<String> {
    let (code, suffix) = symbol.trim().rsplit_once('.')?;
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    match suffix.to_ascii_uppercase().as_str() {
        "TW" => Some(format!("tse_{}.tw", code.to_ascii_lowercase())),
        "TWO" => Some(format!("otc_{}.tw", code.to_ascii_lowercase())),
        _ => None,
    }
}

pub fn quote_from_response(normaliser: &Normaliser, resp: &StockInfoResponse) -> RawQuote {
    if let Some(code) = resp.rtcode.as_deref().filter(|c| *c != "0000") {
        debug!(rtcode = code, message = ?resp.rtmessage, "twse returned a non-success code");
    }
    let Some(info) = resp.msg_array.as_ref().and_then(|a| a.first()) else {
        return RawQuote::absent();
    };
    // only `z` is a real trade; never back-fill it from h/l/o
    let latest = info.z.as_deref().and_then(|z| normaliser.price_from_str(z));
    let previous = info.y.as_deref().and_then(|y| normaliser.price_from_str(y));
    RawQuote::new(latest, previous)
}

#[async_trait::async_trait]
impl QuoteProvider for TwseAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Twse
    }

    async fn fetch(&self, symbol: &str) -> RawQuote {
        let Some(channel) = exchange_channel(symbol) else {
            warn!(provider = "twse", symbol, "symbol is not listed on TWSE/TPEx");
            record_fetch(ProviderKind::Twse, &RawQuote::absent());
            return RawQuote::absent();
        };
        let raw = match self.request(&channel).await {
            Ok(resp) => quote_from_response(&self.normaliser, &resp),
            Err(e) => {
                warn!(provider = "twse", symbol, error = %e, "stock info request failed");
                RawQuote::absent()
            }
        };
        if !raw.is_complete() {
            warn!(provider = "twse", symbol, ?raw, "incomplete quote");
        }
        record_fetch(ProviderKind::Twse, &raw);
        raw
    }
}
