pub mod face;
pub mod name;
pub mod packet;
pub mod tlv;

pub use face::{FaceError, FaceEvent, NdnFace, NullFace};
pub use name::{Name, NameComponent};
pub use packet::{Data, Interest, KeyLocator, Link};
