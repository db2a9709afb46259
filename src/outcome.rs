/// The final result of one retried call.
///
/// An outcome either carries the value of the attempt that succeeded or the failure of the
/// last attempt made, together with the number of attempts it took.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryOutcome<T, E> {
    result: Result<T, E>,
    attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    pub(crate) fn new(result: Result<T, E>, attempts: u32) -> Self {
        Self { result, attempts }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&E> {
        self.result.as_ref().err()
    }

    pub fn into_value(self) -> Option<T> {
        self.result.ok()
    }

    pub fn into_failure(self) -> Option<E> {
        self.result.err()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}
