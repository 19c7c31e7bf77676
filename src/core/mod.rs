// Core error modeling shared by every helper.
pub mod error;
