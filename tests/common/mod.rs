#![allow(dead_code)]

use analytics_report::error::FetchError;
use analytics_report::models::{Cursor, DateRange, Page, ReportQuery, Row};
use analytics_report::source::PageSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&ReportQuery, Option<&Cursor>) -> Result<Page, FetchError> + Send + Sync>;

/// Page source double that records every call it receives.
pub struct ScriptedSource {
    responder: Responder,
    calls: Mutex<Vec<(ReportQuery, Option<Cursor>)>>,
}

impl ScriptedSource {
    /// Serve `pages` in order, one per call, regardless of the cursor.
    pub fn pages(pages: Vec<Page>) -> Self {
        let queue = Mutex::new(pages.into_iter().collect::<VecDeque<_>>());
        Self::from_fn(move |_, _| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| FetchError::transport("script exhausted"))
        })
    }

    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ReportQuery, Option<&Cursor>) -> Result<Page, FetchError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ReportQuery, Option<Cursor>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, query: &ReportQuery, cursor: Option<&Cursor>) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push((query.clone(), cursor.cloned()));
        (self.responder)(query, cursor)
    }
}

pub fn row(dimensions: &[&str], views: u64) -> Row {
    Row::new(dimensions.iter().map(|d| d.to_string()).collect(), vec![views])
}

pub fn page(rows: Vec<Row>, next: Option<&str>) -> Page {
    Page::new(rows, next.map(Cursor::new))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn range() -> DateRange {
    DateRange::new(day(2022, 1, 1), day(2022, 12, 31))
}
