//! Windows packaging: WiX installers, code signing and driver packages.

pub mod driver;
pub mod sign;
pub mod wix;

pub use driver::DriverPackager;
pub use sign::{SignAction, SignKind, Signer};
pub use wix::{WixLinker, WixRequest};
