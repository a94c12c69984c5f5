use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Cursor, Page, ReportQuery};

/// Anything that can serve one page of a report.
///
/// `cursor` is `None` for the first page and otherwise the token returned with
/// the previous page. Implementations must not depend on call order beyond the
/// cursor itself.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, query: &ReportQuery, cursor: Option<&Cursor>) -> Result<Page, FetchError>;
}

#[async_trait]
impl<S: PageSource + ?Sized> PageSource for &S {
    async fn fetch_page(&self, query: &ReportQuery, cursor: Option<&Cursor>) -> Result<Page, FetchError> {
        (**self).fetch_page(query, cursor).await
    }
}
