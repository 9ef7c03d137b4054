use std::{
    alloc::{self, Layout},
    cell::{Cell, RefCell},
};

use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use thiserror::Error;
use tracing::warn;

/// The "no instance" outcome of a constructor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to allocate {size} bytes for {type_name}")]
pub struct AllocError {
    type_name: &'static str,
    size: usize,
}

impl AllocError {
    pub fn of<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            size: size_of::<T>(),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub const fn size(&self) -> usize {
        self.size
    }
}

fn failed<T>() -> AllocError {
    let error = AllocError::of::<T>();
    warn!(%error, "allocation failed");

    error
}

/// Moves a value into memory owned by a `Box`, reporting exhaustion instead of
/// aborting the process.
pub trait Allocate {
    fn allocate<T>(&self, value: T) -> Result<Box<T>, AllocError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Heap;

impl Allocate for Heap {
    fn allocate<T>(&self, value: T) -> Result<Box<T>, AllocError> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            return Ok(Box::new(value));
        }

        // SAFETY: the layout has a non-zero size
        let pointer = unsafe { alloc::alloc(layout) }.cast::<T>();
        if pointer.is_null() {
            return Err(failed::<T>());
        }

        // SAFETY: `pointer` is non-null and was returned by the global allocator for
        // `Layout::new::<T>()`, which is the layout `Box<T>` frees with. It is
        // initialized before the box takes ownership.
        unsafe {
            pointer.write(value);

            Ok(Box::from_raw(pointer))
        }
    }
}

/// Succeeds for the first `successes` allocations, fails for every one after.
#[derive(Debug)]
pub struct FailAfter {
    remaining: Cell<usize>,
}

impl FailAfter {
    pub const fn new(successes: usize) -> Self {
        Self {
            remaining: Cell::new(successes),
        }
    }

    pub const fn exhausted() -> Self {
        Self::new(0)
    }
}

impl Allocate for FailAfter {
    fn allocate<T>(&self, value: T) -> Result<Box<T>, AllocError> {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return Err(failed::<T>());
        }

        self.remaining.set(remaining - 1);

        Heap.allocate(value)
    }
}

/// Fails each allocation with probability `rate`, drawn from a seeded generator
/// so that a run can be replayed.
#[derive(Debug)]
pub struct FaultInjector {
    rate: f64,
    rng: RefCell<StdRng>,
}

impl FaultInjector {
    pub fn new(rate: f64, seed: u64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };

        Self {
            rate,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub const fn rate(&self) -> f64 {
        self.rate
    }
}

impl Allocate for FaultInjector {
    fn allocate<T>(&self, value: T) -> Result<Box<T>, AllocError> {
        if self.rng.borrow_mut().random_bool(self.rate) {
            return Err(failed::<T>());
        }

        Heap.allocate(value)
    }
}

/// Allocation strategy picked at runtime.
#[derive(Debug)]
pub enum Policy {
    Heap(Heap),
    FailAfter(FailAfter),
    FaultInjector(FaultInjector),
}

impl Default for Policy {
    fn default() -> Self {
        Self::Heap(Heap)
    }
}

impl Allocate for Policy {
    fn allocate<T>(&self, value: T) -> Result<Box<T>, AllocError> {
        match self {
            Self::Heap(heap) => heap.allocate(value),
            Self::FailAfter(fail_after) => fail_after.allocate(value),
            Self::FaultInjector(fault_injector) => fault_injector.allocate(value),
        }
    }
}
