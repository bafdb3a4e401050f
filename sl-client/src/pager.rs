//! Assembles the pages of a successful query into one table.

use std::future::Future;

use futures::future::join_all;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, SlError, SlResult};
use crate::models::{QueryId, QueryResult, ResultTable};
use crate::runtime::ExecutionMode;

/// Builds the full result of `query_id` from its first page.
///
/// Pages `2..=total_pages` are requested through `fetch_page`. In
/// [`ExecutionMode::NonBlocking`] all requests are issued before any is awaited; in
/// [`ExecutionMode::Blocking`] they run one after another. Either way the rows of the result are
/// in page order. Failed fetches are aggregated into a single error.
pub async fn assemble<P, F>(
    mode: ExecutionMode,
    query_id: &QueryId,
    first_page: QueryResult,
    fetch_page: P,
) -> SlResult<ResultTable>
where
    P: Fn(u32) -> F,
    F: Future<Output = SlResult<QueryResult>>,
{
    let total_pages = match first_page.total_pages {
        Some(0) | None => bail!(
            ErrorKind::InvalidData,
            "Successful query result reports no pages",
            format!("query {query_id}")
        ),
        Some(total_pages) => total_pages,
    };

    let first_table = first_page.result_table()?;
    if total_pages == 1 {
        return Ok(first_table);
    }

    debug!(%query_id, total_pages, ?mode, "fetching remaining result pages");

    let pages = match mode {
        ExecutionMode::NonBlocking => join_all((2..=total_pages).map(&fetch_page)).await,
        ExecutionMode::Blocking => {
            let mut pages = Vec::with_capacity(total_pages as usize - 1);
            for page_num in 2..=total_pages {
                pages.push(fetch_page(page_num).await);
            }
            pages
        }
    };

    let mut tables = Vec::with_capacity(total_pages as usize);
    tables.push(first_table);
    let mut errors = Vec::new();
    for page in pages {
        match page.and_then(|page| page.result_table()) {
            Ok(table) => tables.push(table),
            Err(err) => errors.push(err.with_query_id(query_id.clone())),
        }
    }

    if !errors.is_empty() {
        return Err(SlError::from(errors));
    }

    ResultTable::concat(tables)
}
