// HTML rendering. Pure functions of their inputs; nothing here does I/O.

use std::fmt::Write as _;

use quick_xml::escape::escape;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;

use crate::config::{ColorSettings, DashboardSettings};
use crate::news::NewsOutcome;
use crate::quote::resolver::Resolution;
use crate::quote::types::{Sign, SymbolConfig};

const WIDGET_SCRIPT: &str = "https://s3.tradingview.com/external-embedding/embed-widget-advanced-chart.js";

pub struct Page<'a> {
    pub settings: &'a DashboardSettings,
    pub symbols: &'a [SymbolConfig],
    pub selected: &'a SymbolConfig,
    pub resolution: &'a Resolution,
    pub caption: String,
    pub news_query: &'a str,
    pub news: &'a NewsOutcome,
}

pub fn sign_color<'a>(colors: &'a ColorSettings, sign: Sign) -> &'a str {
    match sign {
        Sign::Positive => &colors.positive,
        Sign::Negative => &colors.negative,
        Sign::Flat => &colors.flat,
    }
}

fn round2(d: Decimal) -> Decimal {
    let r = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // avoid printing "-0.00"
    if r.is_zero() {
        Decimal::ZERO
    } else {
        r
    }
}

// 1045.5 -> "1,045.50"
pub fn format_price(d: Decimal) -> String {
    let s = format!("{:.2}", round2(d));
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (int_part, frac) = body.split_once('.').unwrap_or((body, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac}")
}

// always signed: "+3.50", "-1.20", "+0.00"
pub fn format_change(d: Decimal) -> String {
    let r = round2(d);
    if r.is_sign_negative() {
        format!("{:.2}", r)
    } else {
        format!("+{:.2}", r)
    }
}

pub fn format_percent(d: Decimal) -> String {
    format!("{}%", format_change(d))
}

fn metric(label: &str, value: &str, color: &str) -> String {
    format!(
        r#"<div class="metric"><div class="metric-label">{}</div><div class="metric-value" style="color:{}">{}</div></div>"#,
        escape(label),
        escape(color),
        escape(value)
    )
}

pub fn render_quote(resolution: &Resolution, colors: &ColorSettings) -> String {
    match resolution {
        Resolution::Available { quote, change } => {
            let color = sign_color(colors, change.sign);
            let mut out = format!(r#"<h2 class="quote-name">{}</h2>"#, escape(&quote.display_name));
            out.push_str(r#"<div class="metrics">"#);
            out.push_str(&metric("Price", &format_price(change.latest), &colors.price));
            out.push_str(&metric("Change", &format_change(change.change), color));
            out.push_str(&metric("Change %", &format_percent(change.change_percent), color));
            out.push_str("</div>");
            out
        }
        Resolution::Unavailable { symbol, display_name, reason } => format!(
            r#"<h2 class="quote-name">{}</h2><div class="notice warning">{} ({}): {}</div>"#,
            escape(display_name),
            escape(display_name),
            escape(symbol),
            escape(reason.message())
        ),
    }
}

pub fn render_news(symbol: &str, query: &str, news: &NewsOutcome) -> String {
    let mut out = String::from(r#"<section class="news"><h3>News</h3>"#);
    let _ = write!(
        out,
        r#"<form method="get" action="/"><input type="hidden" name="tab" value="{}"><input type="text" name="q" value="{}" aria-label="News keyword"><button type="submit">Search</button></form>"#,
        escape(symbol),
        escape(query)
    );
    match news {
        NewsOutcome::Entries(entries) => {
            out.push_str("<ul>");
            for e in entries {
                let _ = write!(
                    out,
                    r#"<li><a href="{}" target="_blank" rel="noopener">{}</a></li>"#,
                    escape(&e.link),
                    escape(&e.title)
                );
            }
            out.push_str("</ul>");
        }
        NewsOutcome::Empty | NewsOutcome::Unavailable => {
            out.push_str(r#"<div class="notice info">No news right now; the feed may be empty or unreachable.</div>"#);
        }
    }
    out.push_str("</section>");
    out
}

pub fn render_widget(ticker: &str, theme: &str) -> String {
    let config = json!({
        "symbol": ticker,
        "interval": "D",
        "theme": theme,
        "style": "1",
        "locale": "zh_TW",
        "autosize": true,
        "allow_symbol_change": false,
    });
    // keep a "</script>" inside a ticker from closing the tag
    let config = config.to_string().replace("</", "<\\/");
    format!(
        r#"<div class="tradingview-widget-container" style="height:420px"><div class="tradingview-widget-container__widget" style="height:100%"></div><script type="text/javascript" src="{WIDGET_SCRIPT}" async>{config}</script></div>"#
    )
}

fn render_tabs(symbols: &[SymbolConfig], selected: &SymbolConfig) -> String {
    let mut out = String::from(r#"<nav class="tabs">"#);
    for s in symbols {
        let class = if s.symbol == selected.symbol { "tab active" } else { "tab" };
        let _ = write!(
            out,
            r#"<a class="{}" href="/?tab={}">{}</a>"#,
            class,
            escape(&s.symbol),
            escape(&s.display_name)
        );
    }
    out.push_str("</nav>");
    out
}

pub fn render_page(page: &Page<'_>) -> String {
    let settings = page.settings;
    let (bg, fg) = match settings.theme {
        crate::config::Theme::Light => ("#ffffff", "#222222"),
        crate::config::Theme::Dark => ("#0e1117", "#fafafa"),
    };
    let refresh = if settings.refresh_secs > 0 {
        format!(r#"<meta http-equiv="refresh" content="{}">"#, settings.refresh_secs)
    } else {
        String::new()
    };

    let mut body = String::new();
    let _ = write!(body, "<h1>{}</h1>", escape(&settings.title));
    let _ = write!(body, r#"<p class="caption">{}</p>"#, escape(&page.caption));
    body.push_str(&render_tabs(page.symbols, page.selected));
    body.push_str(r#"<main class="panel">"#);
    body.push_str(&render_quote(page.resolution, &settings.colors));
    body.push_str("<hr>");
    body.push_str(&render_news(&page.selected.symbol, page.news_query, page.news));
    if settings.widgets && !page.selected.widget_ticker.is_empty() {
        body.push_str(&render_widget(&page.selected.widget_ticker, settings.theme.as_str()));
    }
    body.push_str("</main>");

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 760px; margin: 0 auto; padding: 16px; background: {bg}; color: {fg}; }}
.caption {{ font-size: 12px; color: #888; }}
.tabs {{ display: flex; gap: 8px; margin: 12px 0; }}
.tab {{ padding: 6px 12px; border-radius: 8px; text-decoration: none; color: inherit; border: 1px solid rgba(200,200,200,0.35); }}
.tab.active {{ font-weight: 700; border-color: #ff4b4b; }}
.metrics {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 8px; }}
.metric {{ border: 1px solid rgba(200,200,200,0.35); border-radius: 14px; padding: 12px 14px; margin: 4px 0; background: rgba(255,255,255,0.04); }}
.metric-label {{ font-size: 12px; color: #888; margin-bottom: 6px; }}
.metric-value {{ font-size: 28px; font-weight: 700; }}
.notice {{ padding: 10px 14px; border-radius: 8px; margin: 8px 0; }}
.notice.warning {{ background: rgba(255,189,69,0.2); }}
.notice.info {{ background: rgba(28,131,225,0.1); }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(&settings.title),
    )
}
