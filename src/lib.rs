pub mod character;
pub mod cursor;
pub mod decrypt;
pub mod ending;
pub mod error;
pub mod exe;
pub mod exepack;
pub mod font;
pub mod huffman;
pub mod image;
pub mod map;
pub mod mob;
pub mod player;
pub mod portrait;
pub mod reader;
pub mod sprite;
pub mod strings;
pub mod tile;
pub mod title;
pub mod vxor;

pub use error::{Error, Result};
