pub mod base_conv;
pub mod modular;
pub mod poly;
pub mod rns;

pub use base_conv::BaseConverter;
pub use modular::Modulus;
pub use poly::PlainPoly;
pub use rns::{RnsBasis, RnsPoly};
