use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Generation, UmbraError};

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub generation: Generation,
    pub error: UmbraError,
}

/// Channel for recovered faults, such as text that still overflows after
/// the fallback. Reporting never fails the operation that found the fault.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, generation: Generation, error: UmbraError) {
        log::warn!("generation {generation}: {error}");
        self.records.lock().push(Diagnostic { generation, error });
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
