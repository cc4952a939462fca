pub mod address_validator;
pub mod amount; // 十进制金额 <-> 最小单位

pub use address_validator::AddressValidator;
