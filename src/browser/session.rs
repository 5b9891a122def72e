use crate::criteria::FilterCriteria;

/// A claim on one page of one search. Results are only accepted while the
/// ticket's generation is still the active one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: u32,
    pub criteria: FilterCriteria,
}

// state of the search currently on screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchSession {
    generation: u64,
    criteria: FilterCriteria,
    pages_loaded: u32,
    exhausted: bool,
    in_flight: Option<u32>,
}

impl SearchSession {
    pub fn new(generation: u64, criteria: FilterCriteria) -> Self {
        Self {
            generation,
            criteria,
            pages_loaded: 0,
            exhausted: false,
            in_flight: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    pub(crate) fn next_ticket(&mut self) -> Option<PageTicket> {
        if self.exhausted || self.in_flight.is_some() {
            return None;
        }
        self.pages_loaded += 1;
        self.criteria.page = self.pages_loaded;
        self.in_flight = Some(self.pages_loaded);
        Some(PageTicket {
            generation: self.generation,
            page: self.pages_loaded,
            criteria: self.criteria.clone(),
        })
    }

    // only the outstanding page of the active search, and only once
    pub(crate) fn owns(&self, ticket: &PageTicket) -> bool {
        ticket.generation == self.generation && self.in_flight == Some(ticket.page)
    }

    // `received` is None when the fetch failed; the page number stays spent
    pub(crate) fn settle(&mut self, received: Option<usize>, page_size: usize) {
        self.in_flight = None;
        if let Some(count) = received {
            self.exhausted = count < page_size;
        }
    }
}
