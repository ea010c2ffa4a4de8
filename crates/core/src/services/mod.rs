//! Conversion services: the capability view over both front ends and the
//! pipeline that drives them into a radare2 script.

pub mod convert;
pub mod extract;
