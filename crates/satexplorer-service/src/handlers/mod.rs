//! Request handlers, one module per resource.

mod mosaics;
mod proxy;
mod search;

pub use mosaics::{create_mosaic, get_mosaic};
pub use proxy::proxy_tiler;
pub use search::search;
