pub mod chunk;
pub mod header;
pub mod records;

pub mod read;
pub mod write;

pub mod io;

pub mod animator;
pub mod channel;
pub mod diagnostics;
pub mod mesh;
pub mod reflect;
pub mod scene;
pub mod skeleton;
pub mod spectrum;
pub mod spline;

pub use animator::{Animator, Path};
pub use chunk::FORMAT_VERSION;
pub use diagnostics::Diagnostics;
pub use io::{Error, Format, load, save};
pub use scene::Scene;

pub type HashMap<K, V> = rapidhash::RapidHashMap<K, V>;
pub type HashSet<T> = rapidhash::RapidHashSet<T>;
