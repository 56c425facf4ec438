//! Token based pagination over remote list calls.
use std::{future::Future, marker::PhantomData};

use crate::ApiError;

/// One page of a remote list call.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Page { items, next_token }
    }

    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_token: None,
        }
    }
}

/// Requests pages one at a time until the service signals exhaustion.
///
/// Exhaustion is an absent next token, an empty one, or one equal to the
/// token that was just sent. The paginator also stops after an error.
pub struct Paginator<T, F> {
    fetch: F,
    next_token: Option<String>,
    done: bool,
    pages: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Paginator<T, F>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    pub fn new(fetch: F) -> Self {
        Paginator {
            fetch,
            next_token: None,
            done: false,
            pages: 0,
            _item: PhantomData,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        !self.done
    }

    /// Number of pages requested so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Requests the next page.
    ///
    /// Returns an empty page once exhausted.
    pub async fn next_page(&mut self) -> Result<Vec<T>, ApiError> {
        if self.done {
            return Ok(vec![]);
        }
        let sent = self.next_token.take();
        self.pages += 1;
        let page = match (self.fetch)(sent.clone()).await {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        match page.next_token.filter(|token| !token.is_empty()) {
            Some(token) if sent.as_ref() == Some(&token) => {
                log::trace!("next token repeated, stopping after {} pages", self.pages);
                self.done = true;
            }
            Some(token) => self.next_token = Some(token),
            None => self.done = true,
        }
        Ok(page.items)
    }

    /// Drains every remaining page.
    pub async fn collect_all(mut self) -> Result<Vec<T>, ApiError> {
        let mut items = vec![];
        while self.has_more_pages() {
            items.extend(self.next_page().await?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    /// Serves canned pages and records the tokens it was sent.
    struct Pages {
        pages: Mutex<Vec<Result<Page<u32>, ApiError>>>,
        sent: Mutex<Vec<Option<String>>>,
    }

    impl Pages {
        fn new(mut pages: Vec<Result<Page<u32>, ApiError>>) -> Self {
            pages.reverse();
            Pages {
                pages: Mutex::new(pages),
                sent: Mutex::default(),
            }
        }

        async fn fetch(&self, token: Option<String>) -> Result<Page<u32>, ApiError> {
            self.sent.lock().unwrap().push(token);
            self.pages
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| panic!("requested a page past the end"))
        }

        fn sent(&self) -> Vec<Option<String>> {
            self.sent.lock().unwrap().clone()
        }
    }

    fn token(s: &str) -> Option<String> {
        Some(s.to_owned())
    }

    #[tokio::test]
    async fn follows_tokens_until_absent() {
        let pages = Pages::new(vec![
            Ok(Page::new(vec![1, 2], token("a"))),
            Ok(Page::new(vec![3], token("b"))),
            Ok(Page::last(vec![4])),
        ]);
        let items = Paginator::new(|t| pages.fetch(t))
            .collect_all()
            .await
            .unwrap();
        assert_eq!(vec![1, 2, 3, 4], items);
        assert_eq!(vec![None, token("a"), token("b")], pages.sent());
    }

    #[tokio::test]
    async fn empty_token_ends() {
        let pages = Pages::new(vec![Ok(Page::new(vec![1], token("")))]);
        let mut paginator = Paginator::new(|t| pages.fetch(t));
        assert!(paginator.has_more_pages());
        assert_eq!(vec![1], paginator.next_page().await.unwrap());
        assert!(!paginator.has_more_pages());
        assert_eq!(Vec::<u32>::new(), paginator.next_page().await.unwrap());
        assert_eq!(1, pages.sent().len());
    }

    #[tokio::test]
    async fn repeated_token_ends() {
        let pages = Pages::new(vec![
            Ok(Page::new(vec![1], token("same"))),
            Ok(Page::new(vec![2], token("same"))),
        ]);
        let items = Paginator::new(|t| pages.fetch(t))
            .collect_all()
            .await
            .unwrap();
        assert_eq!(vec![1, 2], items);
        assert_eq!(vec![None, token("same")], pages.sent());
    }

    #[tokio::test]
    async fn error_ends() {
        let pages = Pages::new(vec![
            Ok(Page::new(vec![1], token("a"))),
            Err(ApiError::service("ThrottlingException", "Rate exceeded")),
        ]);
        let mut paginator = Paginator::new(|t| pages.fetch(t));
        assert_eq!(vec![1], paginator.next_page().await.unwrap());
        let err = paginator.next_page().await.unwrap_err();
        assert!(err.is_code("ThrottlingException"));
        assert!(!paginator.has_more_pages());
        assert_eq!(2, paginator.pages());
    }
}
