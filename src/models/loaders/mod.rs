pub mod seeds_loader;

pub use seeds_loader::load_seeds;
