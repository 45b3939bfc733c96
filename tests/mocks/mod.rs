pub mod captions;
pub mod completion;
