use crate::error::{AppError, Operation, Result};

/// Single slot for the operation currently in flight. A second operation is
/// refused until the first one finishes.
#[derive(Debug, Default)]
pub struct OperationGuard {
    pending: Option<Operation>,
}

impl OperationGuard {
    pub fn begin(&mut self, op: Operation) -> Result<()> {
        match self.pending {
            Some(current) => Err(AppError::Busy(current)),
            None => {
                self.pending = Some(op);
                Ok(())
            }
        }
    }

    pub fn finish(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<Operation> {
        self.pending
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_reports_the_first_operation() {
        let mut guard = OperationGuard::default();
        guard.begin(Operation::Import).unwrap();
        assert!(matches!(
            guard.begin(Operation::Insert),
            Err(AppError::Busy(Operation::Import))
        ));
        guard.finish();
        assert!(!guard.is_busy());
        guard.begin(Operation::Insert).unwrap();
        assert_eq!(guard.pending(), Some(Operation::Insert));
    }
}
