//! Pagination driver behaviour against scripted page sources

use analytics_report::error::{ExhaustionReason, FetchError, ReportError};
use analytics_report::models::{Cursor, Page, ReportQuery};
use analytics_report::pagination::PaginationDriver;

mod common;
use common::{page, range, row, ScriptedSource};

fn query() -> ReportQuery {
    ReportQuery::path_prefix("118513499", "digital.lib.utk.edu/collections/islandora/search", range(), 70_000)
}

#[tokio::test]
async fn test_concatenates_pages_in_order() -> anyhow::Result<()> {
    let source = ScriptedSource::pages(vec![
        page(vec![row(&["/a"], 1), row(&["/b"], 2)], Some("c1")),
        page(vec![row(&["/c"], 3)], Some("c2")),
        page(vec![row(&["/d"], 4), row(&["/e"], 5)], None),
    ]);
    let driver = PaginationDriver::new(&source);

    let rows = driver.fetch_all(&query()).await?;

    let paths: Vec<&str> = rows.iter().filter_map(|r| r.dimension(0)).collect();
    assert_eq!(paths, vec!["/a", "/b", "/c", "/d", "/e"]);
    assert_eq!(source.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_query_constant_and_cursor_forwarded() -> anyhow::Result<()> {
    let source = ScriptedSource::pages(vec![
        page(vec![row(&["/a"], 1)], Some("c1")),
        page(vec![row(&["/b"], 1)], Some("c2")),
        page(vec![], None),
    ]);
    let driver = PaginationDriver::new(&source);
    let query = query();

    driver.fetch_all(&query).await?;

    let calls = source.calls();
    let cursors: Vec<Option<&str>> = calls.iter().map(|(_, c)| c.as_ref().map(Cursor::as_str)).collect();
    assert_eq!(cursors, vec![None, Some("c1"), Some("c2")]);
    assert!(calls.iter().all(|(q, _)| *q == query));
    Ok(())
}

#[tokio::test]
async fn test_empty_page_is_not_an_error() -> anyhow::Result<()> {
    let source = ScriptedSource::pages(vec![
        page(vec![], Some("c1")),
        page(vec![row(&["/a"], 9)], None),
    ]);
    let rows = PaginationDriver::new(&source).fetch_all(&query()).await?;
    assert_eq!(rows.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_single_page_without_rows() -> anyhow::Result<()> {
    let source = ScriptedSource::pages(vec![Page::default()]);
    let rows = PaginationDriver::new(&source).fetch_all(&query()).await?;
    assert!(rows.is_empty());
    assert_eq!(source.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_repeating_cursor_is_exhausted() {
    let source = ScriptedSource::from_fn(|_, _| Ok(page(vec![row(&["/a"], 1)], Some("c1"))));
    let result = PaginationDriver::new(&source).fetch_all(&query()).await;

    match result {
        Err(ReportError::ExhaustedPagination { cursor, reason, pages }) => {
            assert_eq!(cursor, "c1");
            assert_eq!(reason, ExhaustionReason::RepeatedCursor);
            assert_eq!(pages, 2);
        }
        other => panic!("expected exhausted pagination, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cursor_cycle_is_exhausted() {
    let source = ScriptedSource::from_fn(|_, cursor| {
        let next = match cursor.map(Cursor::as_str) {
            None | Some("c2") => "c1",
            _ => "c2",
        };
        Ok(page(vec![], Some(next)))
    });
    let result = PaginationDriver::new(&source).fetch_all(&query()).await;
    assert!(matches!(
        result,
        Err(ReportError::ExhaustedPagination { reason: ExhaustionReason::RepeatedCursor, .. })
    ));
    assert_eq!(source.call_count(), 3);
}

#[tokio::test]
async fn test_page_limit_is_exhausted() {
    let source = ScriptedSource::from_fn(|_, cursor| {
        let next = cursor.map_or(1, |c| c.as_str().parse::<u32>().unwrap() + 1);
        Ok(page(vec![row(&["/a"], 1)], Some(next.to_string().as_str())))
    });
    let driver = PaginationDriver::with_max_pages(&source, 5);
    let result = driver.fetch_all(&query()).await;

    assert!(matches!(
        result,
        Err(ReportError::ExhaustedPagination { pages: 5, reason: ExhaustionReason::PageLimit, .. })
    ));
    assert_eq!(source.call_count(), 5);
}

#[tokio::test]
async fn test_fetch_error_propagates() {
    let source = ScriptedSource::pages(vec![page(vec![row(&["/a"], 1)], Some("c1"))]);
    let result = PaginationDriver::new(&source).fetch_all(&query()).await;
    assert!(matches!(result, Err(ReportError::Fetch(FetchError::Transport(_)))));
}
