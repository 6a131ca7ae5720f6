// Lazy, restartable iteration over server-paginated list endpoints.
//
// List endpoints answer with `{"data": [...], "total": N, "links": {"next":
// url}}`. A `Listing` keeps the first page buffered; every call to `iter()`
// starts from that page again and fetches later pages only when the
// iterator reaches them.

use crate::api::ApiClient;
use crate::error::Result;
use crate::session::Session;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::VecDeque;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub links: Links,
}

pub struct Listing<'c, T> {
    client: &'c ApiClient,
    session: &'c Session,
    first: Page<T>,
}

impl<'c, T: DeserializeOwned + Clone> Listing<'c, T> {
    /// Fetch the first page of `path`.
    pub fn fetch(
        client: &'c ApiClient,
        session: &'c Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Self> {
        let first: Page<T> = client.get(session, path, query)?;
        Ok(Listing {
            client,
            session,
            first,
        })
    }

    /// Records on the first page.
    pub fn data(&self) -> &[T] {
        &self.first.data
    }

    /// Total number of records reported by the server.
    pub fn total(&self) -> Option<u64> {
        self.first.total
    }

    pub fn has_more(&self) -> bool {
        self.first.links.next.is_some()
    }

    /// Iterate over every record, fetching pages on demand.
    pub fn iter(&self) -> PageIter<'c, T> {
        PageIter {
            client: self.client,
            session: self.session,
            buffer: self.first.data.iter().cloned().collect(),
            next: self.first.links.next.clone(),
            failed: false,
        }
    }

    /// Drain every page into a vector.
    pub fn collect_all(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }
}

pub struct PageIter<'c, T> {
    client: &'c ApiClient,
    session: &'c Session,
    buffer: VecDeque<T>,
    next: Option<String>,
    failed: bool,
}

impl<'c, T: DeserializeOwned> Iterator for PageIter<'c, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.failed {
                return None;
            }
            let url = self.next.take()?;
            tracing::debug!(%url, "fetching next page");
            match self.client.get::<Page<T>>(self.session, &url, &[]) {
                Ok(page) => {
                    self.buffer.extend(page.data);
                    self.next = page.links.next;
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
