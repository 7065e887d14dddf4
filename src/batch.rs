use serde::Serialize;

/// Outcome of one multi-record processing step. Partial failure is a
/// first-class return value: callers inspect the error list instead of
/// inferring success from the absence of an exception.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub successes: Vec<T>,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    /// Identifier of the record that failed (catalog id, contract address...).
    pub record: String,
    pub reason: String,
}

impl<T> BatchResult<T> {
    pub fn new() -> Self {
        Self {
            successes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn push_ok(&mut self, value: T) {
        self.successes.push(value);
    }

    pub fn push_err(&mut self, record: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(BatchError {
            record: record.into(),
            reason: reason.into(),
        });
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one full sync pass. A pass with failed pages is still a
/// completed pass; the failed page numbers are reported, not raised.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success_count: usize,
    pub error_count: usize,
    pub failed_pages: Vec<u32>,
    pub evicted_count: u64,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            success_count: 0,
            error_count: 0,
            failed_pages: Vec::new(),
            evicted_count: 0,
        }
    }

    pub fn absorb<T>(&mut self, batch: &BatchResult<T>) {
        self.success_count += batch.success_count();
        self.error_count += batch.error_count();
    }

    pub fn summary(&self) -> String {
        format!(
            "{} successful, {} errors, {} failed pages, {} evicted",
            self.success_count,
            self.error_count,
            self.failed_pages.len(),
            self.evicted_count
        )
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}
