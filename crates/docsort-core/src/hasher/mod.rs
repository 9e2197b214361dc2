mod xxhash;

pub use xxhash::find_identical;
