pub mod filters;
pub mod likes;
pub mod page;
pub mod photo;

pub use filters::*;
pub use likes::*;
pub use page::*;
pub use photo::*;
