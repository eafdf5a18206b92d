//! Backend scheduling - decides which backends run together

use crate::tree::TreeKind;

/// Strategy for running backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// One backend at a time, in the workload's order
    #[default]
    Sequential,

    /// Every backend at once
    Parallel,

    /// At most N backends at once
    LimitedParallel(usize),
}

impl SchedulingStrategy {
    /// Split backends into batches; each batch runs concurrently and
    /// batches run one after another
    pub fn batches(&self, kinds: &[TreeKind]) -> Vec<Vec<TreeKind>> {
        if kinds.is_empty() {
            return Vec::new();
        }
        let width = match self {
            SchedulingStrategy::Sequential => 1,
            SchedulingStrategy::Parallel => kinds.len(),
            SchedulingStrategy::LimitedParallel(max) => (*max).max(1),
        };
        kinds.chunks(width).map(|chunk| chunk.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_batches() {
        let batches = SchedulingStrategy::Sequential.batches(&TreeKind::all());
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() == 1));
        assert_eq!(batches[0], vec![TreeKind::Radix]);
    }

    #[test]
    fn test_parallel_batches() {
        let batches = SchedulingStrategy::Parallel.batches(&TreeKind::all());
        assert_eq!(batches, vec![TreeKind::all()]);
    }

    #[test]
    fn test_limited_parallel_batches() {
        let batches = SchedulingStrategy::LimitedParallel(3).batches(&TreeKind::all());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1], vec![TreeKind::BTree]);

        // A zero limit still makes progress
        let batches = SchedulingStrategy::LimitedParallel(0).batches(&[TreeKind::Art]);
        assert_eq!(batches, vec![vec![TreeKind::Art]]);
    }

    #[test]
    fn test_no_backends() {
        assert!(SchedulingStrategy::Parallel.batches(&[]).is_empty());
    }
}
