pub mod db_utils;
pub mod error;
pub mod extract;
pub mod password;
pub mod tree;
