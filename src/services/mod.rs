pub mod carousels;
pub mod imports;
pub mod media;
pub mod normalize;
pub mod providers;
pub mod recommendations;
pub mod search;
pub mod wrapped;
