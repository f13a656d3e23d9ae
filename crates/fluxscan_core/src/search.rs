use std::time::Duration;

/// Quiet period after the last keystroke before a search is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Queries shorter than this never reach the server.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
}

impl SymbolMatch {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
        }
    }
}

/// What the controller should do with a fresh search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// Too short to search: answer with an empty list right away.
    Empty,
    /// Wait out the debounce window, then check back with this generation.
    Wait { generation: u64 },
}

/// Generation-counted debounce. Every input supersedes the previous one, so
/// only the generation that survives its quiet period issues a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchDebouncer {
    generation: u64,
    pending: Option<String>,
    in_flight: Option<u64>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn input(&mut self, query: &str) -> SearchStep {
        self.generation += 1;
        self.in_flight = None;
        if query.chars().count() < MIN_QUERY_CHARS {
            self.pending = None;
            return SearchStep::Empty;
        }
        self.pending = Some(query.to_string());
        SearchStep::Wait {
            generation: self.generation,
        }
    }

    /// Called when a debounce window closes. Returns the query to send if
    /// nothing newer arrived in the meantime.
    pub fn elapsed(&mut self, generation: u64) -> Option<String> {
        if generation != self.generation {
            return None;
        }
        let query = self.pending.take()?;
        self.in_flight = Some(generation);
        Some(query)
    }

    /// Accepts results only for the latest issued request.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// True when no search is waiting on its quiet period or on the server.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.in_flight.is_none()
    }
}
