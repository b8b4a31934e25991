pub mod prelude;
pub mod prep;
