pub mod basic;
pub mod stack;
pub mod toncenter_v2;
