//! Testing utilities and harness for imagezoom

pub mod headless;
pub mod testing;

pub use headless::*;
pub use testing::*;

pub mod prelude {
    pub use crate::headless::HeadlessPlatform;
    pub use crate::testing::*;
}
