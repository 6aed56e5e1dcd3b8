use lightbake_gpu::BufferId;

/// Declared capacity of every buffer a kernel may touch, indexed by
/// [`BufferId`]; uploaded alongside each validated dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferCapacities([u32; BufferId::COUNT]);

impl BufferCapacities {
    pub fn set(&mut self, id: BufferId, capacity: usize) {
        self.0[id.get() as usize] = capacity as u32;
    }

    pub fn with(mut self, id: BufferId, capacity: usize) -> Self {
        self.set(id, capacity);
        self
    }

    pub fn get(&self, id: BufferId) -> u32 {
        self.0[id.get() as usize]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for BufferCapacities {
    fn default() -> Self {
        Self([0; BufferId::COUNT])
    }
}
