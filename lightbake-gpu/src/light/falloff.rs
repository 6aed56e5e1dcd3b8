use crate::{BufferView, Validate};

/// Number of entries in a single falloff table.
pub const FALLOFF_TABLE_LEN: i32 = 128;

/// Maps `x` onto a fractional index into a falloff table.
///
/// Tables are sampled reciprocally (`x = 0` lands at the last entry, large
/// values approach the first one), which packs more entries near the light.
pub fn falloff_table_position(x: f32) -> f32 {
    let x = x.max(0.0);
    let n = FALLOFF_TABLE_LEN as f32;

    (n - 1.0) / (1.0 + x * x * (n - 2.0))
}

/// Builds a falloff table from `f`, so that looking up `x` yields `f(x)` at
/// table entries and linearly interpolated values in between.
#[cfg(not(target_arch = "spirv"))]
pub fn falloff_table(
    f: impl Fn(f32) -> f32,
) -> [f32; FALLOFF_TABLE_LEN as usize] {
    let n = FALLOFF_TABLE_LEN as f32;
    let mut table = [0.0; FALLOFF_TABLE_LEN as usize];

    for (idx, entry) in table.iter_mut().enumerate() {
        // Entry 0 stands for `x = inf`
        *entry = if idx == 0 {
            0.0
        } else {
            f((((n - 1.0) / idx as f32 - 1.0) / (n - 2.0)).sqrt())
        };
    }

    table
}

/// Distance- and angular- falloff tables.
///
/// Distance falloffs are stored back-to-back, [`FALLOFF_TABLE_LEN`] entries
/// per table, and picked through the light's falloff index; there's only one
/// angular table, shared by all spot lights.
#[derive(Clone, Copy)]
pub struct FalloffTables<'a> {
    pub distance: BufferView<'a, f32>,
    pub angular: BufferView<'a, f32>,
}

impl<'a> FalloffTables<'a> {
    /// Looks up `distance_scale` (distance over range) in the light's table.
    ///
    /// Distance tables use the same reciprocal remap as the angular one
    /// ([`falloff_table_position()`]), not a linear `x * N` index; tables
    /// built with [`falloff_table()`] match that layout.
    pub fn distance_falloff(
        &self,
        v: &mut impl Validate,
        falloff_index: u32,
        distance_scale: f32,
    ) -> f32 {
        let offset = (falloff_index as i32).wrapping_mul(FALLOFF_TABLE_LEN);

        lookup(v, self.distance, offset, distance_scale)
    }

    pub fn angular_falloff(
        &self,
        v: &mut impl Validate,
        angular_scale: f32,
    ) -> f32 {
        lookup(v, self.angular, 0, angular_scale)
    }
}

fn lookup(
    v: &mut impl Validate,
    table: BufferView<f32>,
    offset: i32,
    x: f32,
) -> f32 {
    let position = falloff_table_position(x);
    let lo = (position as i32).min(FALLOFF_TABLE_LEN - 1);
    let hi = (position as i32 + 1).min(FALLOFF_TABLE_LEN - 1);
    let t = position - lo as f32;

    let a = table.get(v, offset.wrapping_add(lo));
    let b = table.get(v, offset.wrapping_add(hi));

    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{BufferId, Checked, KernelFault};

    fn capacities(distance: u32, angular: u32) -> [u32; BufferId::COUNT] {
        let mut capacities = [0; BufferId::COUNT];

        capacities[BufferId::DistanceFalloffs as usize] = distance;
        capacities[BufferId::AngularFalloffLut as usize] = angular;
        capacities
    }

    #[test]
    fn position() {
        assert_eq!(127.0, falloff_table_position(0.0));
        assert_eq!(127.0, falloff_table_position(-1.0));
        assert_relative_eq!(1.0, falloff_table_position(1.0));
        assert!(falloff_table_position(1000.0) < 0.01);
    }

    #[test]
    fn lookup_reproduces_the_tabulated_function() {
        let quadratic = falloff_table(|x| (1.0 - x * x).max(0.0));
        let linear = falloff_table(|x| (1.0 - x).max(0.0));
        let distance: Vec<f32> =
            quadratic.iter().chain(&linear).copied().collect();
        let angular = falloff_table(|x| x.min(1.0));

        let capacities =
            capacities(distance.len() as u32, angular.len() as u32);

        let mut fault = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut fault);

        let tables = FalloffTables {
            distance: BufferView::new(&distance, BufferId::DistanceFalloffs),
            angular: BufferView::new(&angular, BufferId::AngularFalloffLut),
        };

        // x = 0 and x = 1 land exactly on table entries
        assert_relative_eq!(1.0, tables.distance_falloff(&mut v, 0, 0.0));
        assert_relative_eq!(1.0, tables.distance_falloff(&mut v, 1, 0.0));

        assert_relative_eq!(
            0.0,
            tables.distance_falloff(&mut v, 0, 1.0),
            epsilon = 1e-6
        );

        assert_relative_eq!(
            0.75,
            tables.distance_falloff(&mut v, 0, 0.5),
            epsilon = 0.01
        );

        assert_relative_eq!(
            0.5,
            tables.distance_falloff(&mut v, 1, 0.5),
            epsilon = 0.01
        );

        assert_relative_eq!(
            0.5,
            tables.angular_falloff(&mut v, 0.5),
            epsilon = 0.01
        );

        assert!(!fault.is_some());
    }

    #[test]
    fn distance_and_angular_lookups_share_the_remap() {
        let table = falloff_table(|x| (1.0 - x).max(0.0));
        let capacities = capacities(128, 128);

        let mut fault = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut fault);

        let tables = FalloffTables {
            distance: BufferView::new(&table, BufferId::DistanceFalloffs),
            angular: BufferView::new(&table, BufferId::AngularFalloffLut),
        };

        for x in [0.0, 0.05, 0.1, 0.25, 0.5, 0.9, 1.0] {
            assert_eq!(
                tables.angular_falloff(&mut v, x),
                tables.distance_falloff(&mut v, 0, x)
            );
        }

        // A linear index would land near entry 13, which holds f(0.27)
        assert_relative_eq!(
            0.9,
            tables.distance_falloff(&mut v, 0, 0.1),
            epsilon = 0.01
        );

        assert!(!fault.is_some());
    }

    #[test]
    fn lookup_stays_within_the_table() {
        let distance = falloff_table(|_| 1.0);
        let angular = falloff_table(|_| 1.0);
        let capacities = capacities(128, 128);

        let mut fault = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut fault);

        let tables = FalloffTables {
            distance: BufferView::new(&distance, BufferId::DistanceFalloffs),
            angular: BufferView::new(&angular, BufferId::AngularFalloffLut),
        };

        for x in [-10.0, 0.0, 0.001, 0.3, 1.0, 7.0, 1e9] {
            tables.distance_falloff(&mut v, 0, x);
            tables.angular_falloff(&mut v, x);
        }

        assert!(!fault.is_some());

        let mut v = Checked::new(&capacities, &mut fault);
        tables.distance_falloff(&mut v, 1, 0.5);

        assert!(fault.is_some());
    }
}
