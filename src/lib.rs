//! Three-dimensional bin packing.
//!
//! Places rectangular items into rectangular bins without overlap, trying
//! the six axis-aligned orientations of each item. Items are packed largest
//! first, either greedily or with a strategy that prefers the fewest bins.
//!
//! ```
//! use bin_packer_3d::{Bin, Item, Packer};
//!
//! let mut packer = Packer::new();
//! packer.add_bin(Bin::new("crate", 10.0, 10.0, 10.0, 100.0).unwrap());
//! packer.add_item(Item::new("cube", 5.0, 5.0, 5.0, 1.0).unwrap());
//! packer.pack().unwrap();
//!
//! assert_eq!(packer.bins()[0].items().len(), 1);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod types;

pub use error::{PackError, ValidationError};
pub use model::{Bin, Item};
pub use packer::{Packer, PackingConfig};
pub use types::{Dimensional, Weighted};
