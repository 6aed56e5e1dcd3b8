use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use lightbake_gpu::{BufferId, FaultReason, FaultSink, KernelFault};

/// Host-side counterpart of the device's fault record, shared by all
/// work-items of a CPU dispatch.
#[derive(Debug, Default)]
pub struct FaultRecord {
    reason: AtomicU32,
    line: AtomicU32,
    index: AtomicI32,
    capacity: AtomicU32,
    buffer_id: AtomicU32,
    claims: AtomicU32,
}

impl FaultRecord {
    pub fn sink(&self) -> HostFaultSink<'_> {
        HostFaultSink { record: self }
    }

    /// Returns the first fault recorded since the previous call, clearing the
    /// record.
    ///
    /// Must not be called while a dispatch is in flight.
    pub fn take(&self) -> Option<KernelFault> {
        let claims = self.claims.swap(0, Ordering::AcqRel);

        if claims == 0 {
            return None;
        }

        let fault = KernelFault {
            reason: self.reason.swap(0, Ordering::Relaxed),
            line: self.line.swap(0, Ordering::Relaxed),
            index: self.index.swap(0, Ordering::Relaxed),
            capacity: self.capacity.swap(0, Ordering::Relaxed),
            buffer_id: self.buffer_id.swap(0, Ordering::Relaxed),
            claims,
            ..Default::default()
        };

        log_fault(&fault);

        Some(fault)
    }
}

/// [`FaultSink`] writing into a [`FaultRecord`]; first write wins.
#[derive(Clone, Copy, Debug)]
pub struct HostFaultSink<'a> {
    record: &'a FaultRecord,
}

impl FaultSink for HostFaultSink<'_> {
    fn report(&mut self, fault: KernelFault) {
        if self.record.claims.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        self.record.reason.store(fault.reason, Ordering::Relaxed);
        self.record.line.store(fault.line, Ordering::Relaxed);
        self.record.index.store(fault.index, Ordering::Relaxed);
        self.record.capacity.store(fault.capacity, Ordering::Relaxed);
        self.record.buffer_id.store(fault.buffer_id, Ordering::Relaxed);
    }
}

pub(crate) fn log_fault(fault: &KernelFault) {
    match fault.reason() {
        FaultReason::OutOfBounds => {
            log::warn!(
                "Kernel fault: out-of-bounds access to {:?} at line {}; \
                 index={}, capacity={}, faults={}",
                BufferId::from_raw(fault.buffer_id),
                fault.line,
                fault.index,
                fault.capacity,
                fault.claims,
            );
        }

        FaultReason::AssertionFailed => {
            log::warn!(
                "Kernel fault: assertion failed at line {}; faults={}",
                fault.line,
                fault.claims,
            );
        }

        FaultReason::None => {
            log::warn!("Kernel fault: unknown reason {}", fault.reason);
        }
    }
}
