use crate::{BufferId, FaultSink, KernelFault};

/// Indexing policy used by every kernel.
///
/// The policy is picked by type, so the unchecked flavour compiles down to a
/// plain index and the checked flavour can't be forgotten at a call site.
pub trait Validate {
    /// Returns `idx` if it's within the declared capacity of `buffer`;
    /// otherwise reports the fault and returns `0`.
    fn index(&mut self, idx: i32, buffer: BufferId, line: u32) -> usize;

    /// Reports an assertion failure if `cond` doesn't hold.
    fn assert(&mut self, cond: bool, line: u32);
}

/// Validation compiled out: indices are used as-is.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Unchecked;

impl Validate for Unchecked {
    #[inline(always)]
    fn index(&mut self, idx: i32, _: BufferId, _: u32) -> usize {
        idx as usize
    }

    #[inline(always)]
    fn assert(&mut self, _: bool, _: u32) {
        //
    }
}

/// Validation enabled: indices are checked against a host-provided capacity
/// table and faults go to `sink`.
pub struct Checked<'a, S> {
    capacities: &'a [u32],
    sink: S,
}

impl<'a, S> Checked<'a, S>
where
    S: FaultSink,
{
    pub fn new(capacities: &'a [u32], sink: S) -> Self {
        Self { capacities, sink }
    }

    /// Returns the declared capacity of `buffer`; buffers missing from the
    /// table are treated as empty.
    pub fn capacity(&self, buffer: BufferId) -> u32 {
        let id = buffer.get() as usize;

        if id < self.capacities.len() {
            crate::load(self.capacities, id)
        } else {
            0
        }
    }
}

impl<S> Validate for Checked<'_, S>
where
    S: FaultSink,
{
    fn index(&mut self, idx: i32, buffer: BufferId, line: u32) -> usize {
        let capacity = self.capacity(buffer);

        if idx >= 0 && (idx as u32) < capacity {
            idx as usize
        } else {
            self.sink.report(KernelFault::out_of_bounds(
                line, idx, capacity, buffer,
            ));

            0
        }
    }

    fn assert(&mut self, cond: bool, line: u32) {
        if !cond {
            self.sink.report(KernelFault::assertion_failed(line));
        }
    }
}
