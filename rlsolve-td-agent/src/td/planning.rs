//! One-step environment model and priorities for prioritized sweeping.
use ordered_float::OrderedFloat;
use std::{cmp::Reverse, collections::BinaryHeap};

/// Priorities at or below this value are not worth a planning update.
pub(super) const MIN_PRIORITY: f64 = 1e-5;

/// Deterministic one-step model of the environment.
///
/// For every (state, action) pair, indexed like the action-value table, it
/// remembers the successor state and reward observed last, together with the
/// pending planning priority of the pair.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct EnvModel {
    /// Last observed successor state.
    successors: Vec<Option<usize>>,

    /// Last observed reward.
    rewards: Vec<f64>,

    /// Modeled pairs in the order they were first observed.
    seen: Vec<usize>,

    /// Pending planning priorities.
    priorities: Vec<f64>,
}

impl EnvModel {
    pub fn new(n: usize) -> Self {
        Self {
            successors: vec![None; n],
            rewards: vec![0.0; n],
            seen: Vec::new(),
            priorities: vec![0.0; n],
        }
    }

    /// Records the outcome of taking the action of pair `sa`.
    pub fn observe(&mut self, sa: usize, s1: usize, r: f64) {
        if self.successors[sa].is_none() {
            self.seen.push(sa);
        }
        self.successors[sa] = Some(s1);
        self.rewards[sa] = r;
    }

    /// Returns the modeled successor state and reward of `sa`.
    pub fn outcome(&self, sa: usize) -> Option<(usize, f64)> {
        self.successors[sa].map(|s1| (s1, self.rewards[sa]))
    }

    /// Adds `u` to the priority of every pair leading to state `s`.
    pub fn propagate(&mut self, s: usize, u: f64) {
        for (p, successor) in self.priorities.iter_mut().zip(self.successors.iter()) {
            if *successor == Some(s) {
                *p += u;
            }
        }
    }

    /// Returns up to `n` seen pairs with the highest priority.
    ///
    /// Pairs of equal priority come in table order.
    pub fn ranked(&self, n: usize) -> Vec<usize> {
        let mut heap = self
            .seen
            .iter()
            .filter(|&&sa| self.priorities[sa] > MIN_PRIORITY)
            .map(|&sa| (OrderedFloat(self.priorities[sa]), Reverse(sa)))
            .collect::<BinaryHeap<_>>();

        (0..n)
            .map_while(|_| heap.pop().map(|(_, Reverse(sa))| sa))
            .collect()
    }

    pub fn clear_priority(&mut self, sa: usize) {
        self.priorities[sa] = 0.0;
    }

    pub fn successors(&self) -> &[Option<usize>] {
        &self.successors
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn priorities(&self) -> &[f64] {
        &self.priorities
    }

    pub fn seen(&self) -> &[usize] {
        &self.seen
    }
}
