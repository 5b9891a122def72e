//! Search submission, page loading and scroll prefetch.
//!
//! [`Browser`] ties a [`SearchApi`] to a [`RenderSurface`]. Each submitted
//! search starts a new [`SearchSession`] with a fresh generation number; page
//! results carry the generation they were requested under and are dropped if
//! a newer search has started since. Only one page per session is requested
//! at a time.

mod session;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ClientError, SearchApi};
use crate::criteria::{build_criteria, FilterCriteria};
use crate::filters::FilterPanel;
use crate::render::{render_student, RenderSurface};
use crate::student::StudentRecord;

pub use session::{PageTicket, SearchSession};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const ENTER_KEY: u32 = 13;

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("failed to load page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: ClientError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    Rendered {
        page: u32,
        count: usize,
        exhausted: bool,
    },
    Stale {
        generation: u64,
        page: u32,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub viewport_height: f64,
    pub scroll_offset: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    /// True once the reader is within roughly one viewport of the end, with
    /// a second viewport of lookahead.
    pub fn near_bottom(&self) -> bool {
        2.0 * self.viewport_height + self.scroll_offset >= self.document_height
    }
}

pub struct Browser<A, S> {
    api: A,
    surface: S,
    session: SearchSession,
    generations: u64,
    page_size: usize,
}

impl<A, S> Browser<A, S>
where
    A: SearchApi,
    S: RenderSurface,
{
    pub fn new(api: A, surface: S) -> Self {
        Self {
            api,
            surface,
            session: SearchSession::new(0, FilterCriteria::default()),
            generations: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the active search. Clears the surface and returns the new
    /// generation; nothing is fetched yet.
    pub fn begin_search(&mut self, criteria: FilterCriteria) -> u64 {
        self.generations += 1;
        self.surface.clear();
        info!(
            generation = self.generations,
            query = %criteria.query,
            filters = criteria.filters.len(),
            "new search"
        );
        self.session = SearchSession::new(self.generations, criteria);
        self.generations
    }

    /// Claim the next page of the active search, or None when the search is
    /// exhausted or a page is already outstanding.
    pub fn begin_page(&mut self) -> Option<PageTicket> {
        let ticket = self.session.next_ticket();
        if ticket.is_none() {
            debug!(
                generation = self.session.generation(),
                exhausted = self.session.is_exhausted(),
                in_flight = ?self.session.in_flight(),
                "page request skipped"
            );
        }
        ticket
    }

    pub fn complete_page(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<StudentRecord>, ClientError>,
    ) -> Result<PageOutcome, BrowseError> {
        if !self.session.owns(&ticket) {
            warn!(
                generation = ticket.generation,
                active = self.session.generation(),
                page = ticket.page,
                in_flight = ?self.session.in_flight(),
                "discarding page that is no longer awaited"
            );
            return Ok(PageOutcome::Stale {
                generation: ticket.generation,
                page: ticket.page,
            });
        }

        let students = match result {
            Ok(students) => students,
            Err(source) => {
                self.session.settle(None, self.page_size);
                return Err(BrowseError::Fetch {
                    page: ticket.page,
                    source,
                });
            }
        };

        let count = students.len();
        self.session.settle(Some(count), self.page_size);
        debug!(page = ticket.page, count, "received student page");
        for student in students.iter() {
            self.surface.append(render_student(student));
        }
        Ok(PageOutcome::Rendered {
            page: ticket.page,
            count,
            exhausted: self.session.is_exhausted(),
        })
    }

    pub async fn load_next_page(&mut self) -> Result<Option<PageOutcome>, BrowseError> {
        let Some(ticket) = self.begin_page() else {
            return Ok(None);
        };
        let result = self.api.fetch_page(&ticket.criteria).await;
        self.complete_page(ticket, result).map(Some)
    }

    /// Snapshot the query and filters, start a new search and load its
    /// first page.
    pub async fn submit(
        &mut self,
        query: &str,
        panel: &FilterPanel,
    ) -> Result<Option<PageOutcome>, BrowseError> {
        self.begin_search(build_criteria(query, panel));
        self.load_next_page().await
    }

    /// Key release in the query field. Enter submits, anything else is
    /// ignored.
    pub async fn on_query_key(
        &mut self,
        key: u32,
        query: &str,
        panel: &FilterPanel,
    ) -> Result<Option<PageOutcome>, BrowseError> {
        if key != ENTER_KEY {
            return Ok(None);
        }
        self.submit(query, panel).await
    }

    pub async fn on_scroll(
        &mut self,
        metrics: ScrollMetrics,
    ) -> Result<Option<PageOutcome>, BrowseError> {
        if !metrics.near_bottom() {
            return Ok(None);
        }
        self.load_next_page().await
    }
}
