use std::fmt::Display;
use std::future::Future;

/// Number of records requested per page.
pub const PER_PAGE: u32 = 100;

/// One page of results plus whether the API advertises a following page.
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

/// Drain every page of a paginated listing.
///
/// Pages are requested sequentially starting at 1. The loop stops when a
/// page comes back empty, when the API stops advertising a next page, or
/// when a fetch fails. A failure is logged and whatever has been
/// accumulated so far is returned, so callers see partial data instead
/// of an error.
pub async fn fetch_all_pages<T, E, F, Fut>(resource: &str, mut fetch_page: F) -> Vec<T>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut all_items = Vec::new();
    let mut page: u32 = 1;

    loop {
        match fetch_page(page).await {
            Ok(result) => {
                if result.items.is_empty() {
                    break;
                }

                log::debug!("Found {} {} on page {}", result.items.len(), resource, page);
                all_items.extend(result.items);

                if !result.has_next {
                    break;
                }

                page += 1;
            }
            Err(e) => {
                log::error!("Error fetching {} page {}: {}", resource, page, e);
                break;
            }
        }
    }

    all_items
}
