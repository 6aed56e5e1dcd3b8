use glam::{vec4, Vec4};

pub trait U32Ext
where
    Self: Sized,
{
    fn from_bytes(bytes: [u32; 4]) -> Self;
    fn to_bytes(self) -> [u32; 4];

    /// Unpacks an RGBA8 texel (red in the lowest byte) into `[0, 1]` floats.
    fn unpack_rgba8(self) -> Vec4;
}

impl U32Ext for u32 {
    fn from_bytes([a, b, c, d]: [u32; 4]) -> Self {
        a | (b << 8) | (c << 16) | (d << 24)
    }

    fn to_bytes(mut self) -> [u32; 4] {
        let a = self & 0xff;
        self >>= 8;
        let b = self & 0xff;
        self >>= 8;
        let c = self & 0xff;
        self >>= 8;
        let d = self & 0xff;

        [a, b, c, d]
    }

    fn unpack_rgba8(self) -> Vec4 {
        let [r, g, b, a] = self.to_bytes();

        vec4(r as f32, g as f32, b as f32, a as f32) * (1.0 / 255.0)
    }
}
