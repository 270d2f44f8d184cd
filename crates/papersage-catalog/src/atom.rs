//! arXiv Atom feed parsing.

use chrono::{DateTime, Utc};
use papersage_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::ids::id_from_entry_url;
use crate::types::PaperMetadata;

/// Element whose text is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
    Doi,
    JournalRef,
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    categories: Vec<String>,
    doi: String,
    journal_ref: String,
}

impl EntryBuilder {
    fn text_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Id => &mut self.id,
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
            Field::Doi => &mut self.doi,
            Field::JournalRef => &mut self.journal_ref,
            Field::AuthorName => {
                if self.authors.is_empty() {
                    self.authors.push(String::new());
                }
                let last = self.authors.len() - 1;
                &mut self.authors[last]
            }
        }
    }

    /// `None` for error entries and entries without an `/abs/` id.
    fn build(self) -> Option<PaperMetadata> {
        let arxiv_id = id_from_entry_url(&self.id)?;
        Some(PaperMetadata {
            arxiv_id,
            title: collapse_whitespace(&self.title),
            authors: self
                .authors
                .iter()
                .map(|a| collapse_whitespace(a))
                .filter(|a| !a.is_empty())
                .collect(),
            abstract_text: collapse_whitespace(&self.summary),
            published: normalize_timestamp(&self.published),
            categories: self.categories,
            doi: non_empty(&self.doi),
            journal_ref: non_empty(&self.journal_ref),
        })
    }
}

/// Parse an arXiv API response into metadata records, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<PaperMetadata>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Catalog(format!("malformed Atom feed: {}", e)))?;
        match event {
            Event::Start(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"entry" => entry = Some(EntryBuilder::default()),
                    b"author" if entry.is_some() => {
                        in_author = true;
                        if let Some(entry) = entry.as_mut() {
                            entry.authors.push(String::new());
                        }
                    }
                    b"category" => push_category(entry.as_mut(), &e)?,
                    other if entry.is_some() => field = field_for(other, in_author),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"category" {
                    push_category(entry.as_mut(), &e)?;
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(f)) = (entry.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Catalog(format!("bad text in Atom feed: {}", e)))?;
                    append_text(entry.text_mut(f), &text);
                }
            }
            Event::CData(t) => {
                if let (Some(entry), Some(f)) = (entry.as_mut(), field) {
                    append_text(entry.text_mut(f), &String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        match done.build() {
                            Some(record) => records.push(record),
                            None => debug!("Skipping non-paper Atom entry"),
                        }
                    }
                    field = None;
                    in_author = false;
                }
                b"author" => {
                    in_author = false;
                    field = None;
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn field_for(local_name: &[u8], in_author: bool) -> Option<Field> {
    match local_name {
        b"name" if in_author => Some(Field::AuthorName),
        b"id" if !in_author => Some(Field::Id),
        b"title" => Some(Field::Title),
        b"summary" => Some(Field::Summary),
        b"published" => Some(Field::Published),
        b"doi" => Some(Field::Doi),
        b"journal_ref" => Some(Field::JournalRef),
        _ => None,
    }
}

/// `<category term=".."/>`; `arxiv:primary_category` is not repeated here.
fn push_category(entry: Option<&mut EntryBuilder>, e: &BytesStart<'_>) -> Result<()> {
    let Some(entry) = entry else {
        return Ok(());
    };
    let attr = e
        .try_get_attribute("term")
        .map_err(|err| Error::Catalog(format!("bad category attribute: {}", err)))?;
    if let Some(attr) = attr {
        let term = attr
            .unescape_value()
            .map_err(|err| Error::Catalog(format!("bad category term: {}", err)))?;
        if !term.is_empty() && !entry.categories.iter().any(|c| *c == *term) {
            entry.categories.push(term.into_owned());
        }
    }
    Ok(())
}

fn append_text(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    let s = collapse_whitespace(s);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Re-render a feed timestamp as RFC 3339 in UTC; unparseable values pass through.
fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc).to_rfc3339(),
        Err(_) => raw.to_string(),
    }
}
