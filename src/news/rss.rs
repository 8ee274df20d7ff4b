// Minimal RSS 2.0 reader: <item><title/><link/></item>, nothing else.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

const UNTITLED: &str = "(untitled)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsEntry {
    pub title: String,
    pub link: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Other,
}

#[derive(Default)]
struct PartialEntry {
    title: String,
    link: String,
}

impl PartialEntry {
    fn finish(self) -> NewsEntry {
        let title = self.title.trim();
        NewsEntry {
            title: if title.is_empty() { UNTITLED.to_string() } else { title.to_string() },
            link: self.link.trim().to_string(),
        }
    }
}

/// First `limit` items of the feed, in document order.
pub fn parse_items(xml: &str, limit: usize) -> Result<Vec<NewsEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;
    let mut field = Field::Other;

    while entries.len() < limit {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => current = Some(PartialEntry::default()),
                b"title" => field = Field::Title,
                b"link" => field = Field::Link,
                _ => field = Field::Other,
            },
            Event::Text(t) => {
                // description, pubDate and friends are skipped unread
                if let Some(entry) = current.as_mut().filter(|_| field != Field::Other) {
                    let text = t.unescape()?;
                    push_text(entry, field, &text);
                }
            }
            Event::CData(c) => {
                if let Some(entry) = current.as_mut() {
                    let raw = c.into_inner();
                    push_text(entry, field, &String::from_utf8_lossy(&raw));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"item" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry.finish());
                    }
                    field = Field::Other;
                }
                _ => field = Field::Other,
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn push_text(entry: &mut PartialEntry, field: Field, text: &str) {
    match field {
        Field::Title => entry.title.push_str(text),
        Field::Link => entry.link.push_str(text),
        Field::Other => {}
    }
}
