#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bintable;
pub mod block;
pub mod date;
pub mod derived;
pub mod error;
pub mod granule;
pub mod header;
pub mod math;
pub mod oifits;
pub mod strings;
pub mod table;
pub mod validate;
pub mod value;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use error::{Error, Result};
pub use oifits::OiFitsFile;
