pub mod io;
pub mod mask;
pub mod rgb;

pub use self::mask::BinaryMask;
pub use self::rgb::RgbFrame;
