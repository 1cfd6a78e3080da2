use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::quote::{Quote, QuoteError, QuoteSource};
use crate::runtime::AppEvent;

/// Outcome of one fetch, tagged with the request that started it
#[derive(Clone, Debug)]
pub struct QuoteDelivery {
    pub generation: u64,
    pub outcome: Result<Quote, QuoteError>,
}

/// Runs quote fetches on background threads and filters out stale results.
///
/// Every request bumps the generation; only a delivery carrying the latest
/// generation is accepted. Superseded fetches are left to finish and dropped.
pub struct QuoteLoader {
    source: Arc<dyn QuoteSource>,
    tx: Sender<AppEvent>,
    generation: u64,
}

impl QuoteLoader {
    pub fn new(source: Arc<dyn QuoteSource>, tx: Sender<AppEvent>) -> Self {
        Self {
            source,
            tx,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start one fetch and return its generation
    pub fn request(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        debug!(generation, "quote requested");
        thread::spawn(move || {
            let outcome = source.fetch();
            if let Err(ref e) = outcome {
                warn!(generation, error = %e, "quote fetch failed");
            }
            // receiver gone means the app already quit
            let _ = tx.send(AppEvent::Quote(QuoteDelivery {
                generation,
                outcome,
            }));
        });

        generation
    }

    /// Unwrap a delivery if it answers the latest request
    pub fn accept(&self, delivery: QuoteDelivery) -> Option<Result<Quote, QuoteError>> {
        if delivery.generation != self.generation {
            debug!(
                stale = delivery.generation,
                current = self.generation,
                "dropping superseded quote"
            );
            return None;
        }
        Some(delivery.outcome)
    }
}
