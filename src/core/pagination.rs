use crate::core::errors::ExchangeError;
use std::future::Future;
use tracing::trace;

/// Page size the real-time order query is driven with.
pub const PAGE_SIZE: u32 = 100;

/// Drive an offset/limit paged source until a short page comes back.
///
/// `fetch` receives `(offset, page_size)` and returns the raw records of one
/// page; every record goes through `translate` before it is accumulated. The
/// offset always advances by `page_size`, whatever the translation did with
/// the records. The first fetch or translation error is returned and the
/// records gathered so far are dropped.
pub async fn paginate<Raw, T, F, Fut, Tr>(
    page_size: u32,
    mut fetch: F,
    mut translate: Tr,
) -> Result<Vec<T>, ExchangeError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<Raw>, ExchangeError>>,
    Tr: FnMut(Raw) -> Result<T, ExchangeError>,
{
    if page_size == 0 {
        return Err(ExchangeError::InvalidParameters(
            "page size must be positive".to_string(),
        ));
    }

    let mut accumulated = Vec::new();
    let mut offset = 0u32;

    loop {
        let page = fetch(offset, page_size).await?;
        let fetched = page.len();
        trace!(offset, fetched, "fetched page");

        for raw in page {
            accumulated.push(translate(raw)?);
        }

        if fetched < page_size as usize {
            return Ok(accumulated);
        }

        offset = offset.checked_add(page_size).ok_or_else(|| {
            ExchangeError::MalformedResponse("pagination offset overflowed".to_string())
        })?;
    }
}
