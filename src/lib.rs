pub mod util;
pub mod restype;
pub mod resfork;
pub mod macbinary;
pub mod appledouble;
pub mod resource;
pub mod pict;
pub mod sound;
pub mod icon;
pub mod convert;

#[cfg(test)]
mod testutil;
