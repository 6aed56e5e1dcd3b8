use bytemuck::{Pod, Zeroable};
#[cfg(target_arch = "spirv")]
use spirv_std::arch::atomic_i_increment;
#[cfg(target_arch = "spirv")]
use spirv_std::memory::{Scope, Semantics};

use crate::BufferId;

#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum FaultReason {
    None = 0,
    OutOfBounds = 1,
    AssertionFailed = 2,
}

/// Single-slot record of the first fault raised during a dispatch.
///
/// Every work-item shares the same record; `claims` is bumped atomically and
/// only the work-item that observed `claims == 0` fills the rest of the
/// fields, so all subsequent faults are dropped.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct KernelFault {
    pub reason: u32,
    pub line: u32,
    pub index: i32,
    pub capacity: u32,
    pub buffer_id: u32,
    pub claims: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl KernelFault {
    pub fn out_of_bounds(
        line: u32,
        index: i32,
        capacity: u32,
        buffer_id: BufferId,
    ) -> Self {
        Self {
            reason: FaultReason::OutOfBounds as u32,
            line,
            index,
            capacity,
            buffer_id: buffer_id.get(),
            ..Default::default()
        }
    }

    pub fn assertion_failed(line: u32) -> Self {
        Self {
            reason: FaultReason::AssertionFailed as u32,
            line,
            ..Default::default()
        }
    }

    pub fn is_some(&self) -> bool {
        self.claims > 0
    }

    pub fn reason(&self) -> FaultReason {
        match self.reason {
            1 => FaultReason::OutOfBounds,
            2 => FaultReason::AssertionFailed,
            _ => FaultReason::None,
        }
    }

    /// Copies the payload of `fault` into this record, leaving `claims` be.
    pub fn fill(&mut self, fault: KernelFault) {
        self.reason = fault.reason;
        self.line = fault.line;
        self.index = fault.index;
        self.capacity = fault.capacity;
        self.buffer_id = fault.buffer_id;
    }
}

/// Destination of faults detected by [`crate::Checked`].
pub trait FaultSink {
    /// Records `fault` if nothing has been recorded yet.
    fn report(&mut self, fault: KernelFault);
}

impl<T> FaultSink for &mut T
where
    T: FaultSink + ?Sized,
{
    fn report(&mut self, fault: KernelFault) {
        (**self).report(fault);
    }
}

/// Non-atomic sink, suitable for a record that's owned by a single work-item
/// (e.g. in tests or when running kernels sequentially).
impl FaultSink for KernelFault {
    fn report(&mut self, fault: KernelFault) {
        let claims = self.claims;

        self.claims = claims.wrapping_add(1);

        if claims == 0 {
            self.fill(fault);
        }
    }
}

/// Sink writing into the fault record living in a device storage buffer.
pub struct DeviceFaultSink<'a> {
    record: &'a mut KernelFault,
}

impl<'a> DeviceFaultSink<'a> {
    pub fn new(record: &'a mut KernelFault) -> Self {
        Self { record }
    }
}

impl FaultSink for DeviceFaultSink<'_> {
    #[cfg(target_arch = "spirv")]
    fn report(&mut self, fault: KernelFault) {
        let claims = unsafe {
            atomic_i_increment::<
                u32,
                { Scope::Device as u32 },
                { Semantics::NONE.bits() },
            >(&mut self.record.claims)
        };

        if claims == 0 {
            self.record.fill(fault);
        }
    }

    #[cfg(not(target_arch = "spirv"))]
    fn report(&mut self, fault: KernelFault) {
        self.record.report(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fault_wins() {
        let mut record = KernelFault::default();

        assert!(!record.is_some());

        record.report(KernelFault::out_of_bounds(
            12,
            -3,
            8,
            BufferId::Lights,
        ));

        record.report(KernelFault::assertion_failed(99));

        assert!(record.is_some());
        assert_eq!(2, record.claims);
        assert_eq!(FaultReason::OutOfBounds, record.reason());
        assert_eq!(12, record.line);
        assert_eq!(-3, record.index);
        assert_eq!(8, record.capacity);
        assert_eq!(BufferId::Lights.get(), record.buffer_id);
    }

    #[test]
    fn device_sink_on_host_behaves_like_plain_record() {
        let mut record = KernelFault::default();

        DeviceFaultSink::new(&mut record)
            .report(KernelFault::assertion_failed(7));

        assert_eq!(FaultReason::AssertionFailed, record.reason());
        assert_eq!(7, record.line);
        assert_eq!(1, record.claims);
    }
}
