//! Hardware-facing layer: the register capability every controller driver
//! implements, bit timing arithmetic, and decoding of the raw cause and status
//! words read back from the controller.
pub mod bit_timing;
pub mod registers;
pub mod status;
