use core::panic::Location;

#[cfg(target_arch = "spirv")]
use spirv_std::arch::IndexUnchecked;

use crate::{BufferId, Validate};

/// Reads `items[idx]`.
///
/// On the device this is an unchecked load (the index has already been
/// validated, or validation is compiled out); on the host it's a regular,
/// panicking index so that the reference executor stays memory-safe.
#[inline(always)]
pub fn load<T>(items: &[T], idx: usize) -> T
where
    T: Copy,
{
    #[cfg(target_arch = "spirv")]
    unsafe {
        *items.index_unchecked(idx)
    }

    #[cfg(not(target_arch = "spirv"))]
    {
        items[idx]
    }
}

/// See: [`load()`].
#[inline(always)]
pub fn store<T>(items: &mut [T], idx: usize, value: T) {
    #[cfg(target_arch = "spirv")]
    unsafe {
        *items.index_unchecked_mut(idx) = value;
    }

    #[cfg(not(target_arch = "spirv"))]
    {
        items[idx] = value;
    }
}

/// Read-only view into a device buffer; every access is routed through the
/// active [`Validate`] policy.
#[derive(Clone, Copy)]
pub struct BufferView<'a, T> {
    items: &'a [T],
    id: BufferId,
}

impl<'a, T> BufferView<'a, T>
where
    T: Copy,
{
    pub fn new(items: &'a [T], id: BufferId) -> Self {
        Self { items, id }
    }

    #[track_caller]
    pub fn get(&self, v: &mut impl Validate, idx: i32) -> T {
        let idx = v.index(idx, self.id, Location::caller().line());

        load(self.items, idx)
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Mutable counterpart of [`BufferView`].
pub struct BufferViewMut<'a, T> {
    items: &'a mut [T],
    id: BufferId,
}

impl<'a, T> BufferViewMut<'a, T>
where
    T: Copy,
{
    pub fn new(items: &'a mut [T], id: BufferId) -> Self {
        Self { items, id }
    }

    #[track_caller]
    pub fn get(&self, v: &mut impl Validate, idx: i32) -> T {
        let idx = v.index(idx, self.id, Location::caller().line());

        load(self.items, idx)
    }

    #[track_caller]
    pub fn set(&mut self, v: &mut impl Validate, idx: i32, value: T) {
        let idx = v.index(idx, self.id, Location::caller().line());

        store(self.items, idx, value);
    }

    /// Applies `f` to the item at `idx` in place.
    #[track_caller]
    pub fn update(
        &mut self,
        v: &mut impl Validate,
        idx: i32,
        f: impl FnOnce(T) -> T,
    ) {
        let idx = v.index(idx, self.id, Location::caller().line());

        store(self.items, idx, f(load(self.items, idx)));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Writable 2D image stored row-major in a flat buffer; `x` and `y` are
/// validated separately, against the image's width and height ids.
pub struct ImageViewMut<'a, T> {
    texels: &'a mut [T],
    width: u32,
    width_id: BufferId,
    height_id: BufferId,
}

impl<'a, T> ImageViewMut<'a, T>
where
    T: Copy,
{
    pub fn new(
        texels: &'a mut [T],
        width: u32,
        width_id: BufferId,
        height_id: BufferId,
    ) -> Self {
        Self {
            texels,
            width,
            width_id,
            height_id,
        }
    }

    #[track_caller]
    pub fn write(&mut self, v: &mut impl Validate, x: i32, y: i32, value: T) {
        let line = Location::caller().line();
        let x = v.index(x, self.width_id, line);
        let y = v.index(y, self.height_id, line);

        store(self.texels, y * (self.width as usize) + x, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Checked, FaultReason, KernelFault, Unchecked};

    fn capacities() -> [u32; BufferId::COUNT] {
        let mut capacities = [0; BufferId::COUNT];

        capacities[BufferId::Radiance as usize] = 3;
        capacities[BufferId::DstImageWidth as usize] = 2;
        capacities[BufferId::DstImageHeight as usize] = 2;
        capacities
    }

    #[test]
    fn view_reads_through_policy() {
        let items = [10, 20, 30];
        let view = BufferView::new(&items, BufferId::Radiance);

        assert_eq!(20, view.get(&mut Unchecked, 1));

        let capacities = capacities();
        let mut record = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut record);

        assert_eq!(30, view.get(&mut v, 2));
        assert_eq!(10, view.get(&mut v, 7));
        assert_eq!(FaultReason::OutOfBounds, record.reason());
        assert_eq!(7, record.index);
    }

    #[test]
    fn fault_line_points_at_call_site() {
        let items = [1.0f32];
        let view = BufferView::new(&items, BufferId::Radiance);
        let capacities = capacities();
        let mut record = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut record);

        let line = line!() + 1;
        view.get(&mut v, 5);

        assert_eq!(line, record.line);
    }

    #[test]
    fn faulting_writes_land_in_slot_zero() {
        let mut items = [0, 0, 0];
        let capacities = capacities();
        let mut record = KernelFault::default();

        {
            let mut view = BufferViewMut::new(&mut items, BufferId::Radiance);
            let mut v = Checked::new(&capacities, &mut record);

            view.set(&mut v, 1, 5);
            view.set(&mut v, 3, 7);
            view.update(&mut v, 1, |x| x + 1);
        }

        assert_eq!([7, 6, 0], items);
        assert_eq!(1, record.claims);
    }

    #[test]
    fn image_axes_are_checked_independently() {
        let mut texels = [0u32; 4];
        let capacities = capacities();
        let mut record = KernelFault::default();

        {
            let mut image = ImageViewMut::new(
                &mut texels,
                2,
                BufferId::DstImageWidth,
                BufferId::DstImageHeight,
            );

            let mut v = Checked::new(&capacities, &mut record);

            image.write(&mut v, 1, 1, 11);
            image.write(&mut v, 1, 2, 12);
        }

        assert_eq!([0, 12, 0, 11], texels);
        assert_eq!(BufferId::DstImageHeight.get(), record.buffer_id);
        assert_eq!(2, record.index);
    }
}
